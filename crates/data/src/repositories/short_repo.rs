//! Short position repository.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::{ShortHolding, ShortPositionRecord};

const SHORT_COLUMNS: &str = "id, portfolio_id, stock_id, quantity, open_price, opened_at, \
     duration_seconds, expires_at, closed, close_price, closed_at";

/// An expired contract selected by the sweep, joined with the fallback price
/// of its instrument.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExpiredShort {
    pub id: i64,
    pub portfolio_id: i64,
    pub stock_id: i64,
    pub quantity: i64,
    pub open_price: Decimal,
    pub initial_price: Decimal,
}

/// Repository for short contracts.
#[derive(Debug, Clone)]
pub struct ShortRepository {
    pool: PgPool,
}

impl ShortRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a portfolio's open shorts within an institution, soonest expiry
    /// first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn open_for_portfolio(
        &self,
        portfolio_id: i64,
        institution_id: i64,
    ) -> Result<Vec<ShortHolding>> {
        let records = sqlx::query_as::<_, ShortHolding>(
            r"
            SELECT sp.id AS short_id, sp.stock_id, s.ticker, sp.quantity,
                   sp.open_price, sp.expires_at
            FROM short_positions sp
            JOIN stocks s ON s.id = sp.stock_id AND s.institution_id = $2
            WHERE sp.portfolio_id = $1 AND NOT sp.closed
            ORDER BY sp.expires_at, sp.id
            ",
        )
        .bind(portfolio_id)
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Opens a new short contract.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert_open(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
        quantity: i64,
        open_price: Decimal,
        duration_seconds: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<ShortPositionRecord> {
        let record = sqlx::query_as::<_, ShortPositionRecord>(&format!(
            "INSERT INTO short_positions \
                 (portfolio_id, stock_id, quantity, open_price, duration_seconds, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SHORT_COLUMNS}"
        ))
        .bind(portfolio_id)
        .bind(stock_id)
        .bind(quantity)
        .bind(open_price)
        .bind(duration_seconds)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Locks every open contract for a (portfolio, instrument) pair, ordered
    /// soonest expiry first with id as the tie-break. This is the order the
    /// close planner consumes.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn lock_open(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
    ) -> Result<Vec<ShortPositionRecord>> {
        let records = sqlx::query_as::<_, ShortPositionRecord>(&format!(
            "SELECT {SHORT_COLUMNS} FROM short_positions \
             WHERE portfolio_id = $1 AND stock_id = $2 AND NOT closed \
             ORDER BY expires_at ASC, id ASC \
             FOR UPDATE"
        ))
        .bind(portfolio_id)
        .bind(stock_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }

    /// Total open short quantity for a (portfolio, instrument) pair. Feeds
    /// the per-user short limit.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn open_quantity(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
    ) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT
            FROM short_positions
            WHERE portfolio_id = $1 AND stock_id = $2 AND NOT closed
            ",
        )
        .bind(portfolio_id)
        .bind(stock_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Marks a contract fully closed. The row never changes again.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn mark_closed(
        conn: &mut PgConnection,
        short_id: i64,
        close_price: Decimal,
        closed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE short_positions
            SET closed = TRUE, close_price = $1, closed_at = $2
            WHERE id = $3
            ",
        )
        .bind(close_price)
        .bind(closed_at)
        .bind(short_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reduces an open contract in place after a partial close; the original
    /// open price stays on the remainder.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn reduce_quantity(
        conn: &mut PgConnection,
        short_id: i64,
        quantity: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE short_positions SET quantity = $1 WHERE id = $2")
            .bind(quantity)
            .bind(short_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Locks every expired open contract in an institution, ordered by
    /// (portfolio, id) so concurrent sweeps settle in a stable order.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn lock_expired(
        conn: &mut PgConnection,
        institution_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredShort>> {
        let records = sqlx::query_as::<_, ExpiredShort>(
            r"
            SELECT sp.id, sp.portfolio_id, sp.stock_id, sp.quantity,
                   sp.open_price, s.initial_price
            FROM short_positions sp
            JOIN stocks s ON s.id = sp.stock_id
            WHERE s.institution_id = $1 AND NOT sp.closed AND sp.expires_at <= $2
            ORDER BY sp.portfolio_id, sp.id
            FOR UPDATE OF sp
            ",
        )
        .bind(institution_id)
        .bind(now)
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }
}
