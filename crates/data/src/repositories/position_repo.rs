//! Long position repository.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::{PositionHolding, PositionRecord};

const POSITION_COLUMNS: &str =
    "id, portfolio_id, stock_id, quantity, avg_price, created_at, updated_at";

/// Repository for long positions.
#[derive(Debug, Clone)]
pub struct PositionRepository {
    pool: PgPool,
}

impl PositionRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a portfolio's holdings within an institution, joined with their
    /// instruments, ordered by ticker.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn holdings(
        &self,
        portfolio_id: i64,
        institution_id: i64,
    ) -> Result<Vec<PositionHolding>> {
        let records = sqlx::query_as::<_, PositionHolding>(
            r"
            SELECT p.stock_id, s.ticker, s.name, p.quantity, p.avg_price
            FROM positions p
            JOIN stocks s ON s.id = p.stock_id AND s.institution_id = $2
            WHERE p.portfolio_id = $1
            ORDER BY s.ticker
            ",
        )
        .bind(portfolio_id)
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Locks the (portfolio, instrument) position row, if one exists.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn lock(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
    ) -> Result<Option<PositionRecord>> {
        let record = sqlx::query_as::<_, PositionRecord>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions \
             WHERE portfolio_id = $1 AND stock_id = $2 FOR UPDATE"
        ))
        .bind(portfolio_id)
        .bind(stock_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Inserts a fresh position from a first buy.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
        quantity: i64,
        avg_price: Decimal,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO positions (portfolio_id, stock_id, quantity, avg_price)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(portfolio_id)
        .bind(stock_id)
        .bind(quantity)
        .bind(avg_price)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Rewrites quantity and weighted average after a buy into an existing
    /// position.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn set_quantity_and_avg(
        conn: &mut PgConnection,
        position_id: i64,
        quantity: i64,
        avg_price: Decimal,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE positions
            SET quantity = $1, avg_price = $2, updated_at = now()
            WHERE id = $3
            ",
        )
        .bind(quantity)
        .bind(avg_price)
        .bind(position_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Decrements quantity after a partial sell; the average stays untouched.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn set_quantity(
        conn: &mut PgConnection,
        position_id: i64,
        quantity: i64,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE positions
            SET quantity = $1, updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(quantity)
        .bind(position_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Removes a position whose quantity reached exactly zero.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete(conn: &mut PgConnection, position_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(position_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Total shares of an instrument held across all portfolios. Feeds the
    /// instrument-wide holding limit.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn total_held(conn: &mut PgConnection, stock_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM positions WHERE stock_id = $1",
        )
        .bind(stock_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }
}
