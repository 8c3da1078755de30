//! Portfolio repository.
//!
//! The portfolio row is the serialization point for everything that touches
//! cash: the engine locks it first in every trade transaction.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::PortfolioRecord;

const PORTFOLIO_COLUMNS: &str = "id, user_id, cash_balance, realized_pnl, created_at, updated_at";

/// Repository for portfolio access and settlement.
#[derive(Debug, Clone)]
pub struct PortfolioRepository {
    pool: PgPool,
}

impl PortfolioRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a user's portfolio, creating it with the seed balance on first
    /// access.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn get_or_create(&self, user_id: i64, seed_cash: Decimal) -> Result<PortfolioRecord> {
        sqlx::query(
            r"
            INSERT INTO portfolios (user_id, cash_balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(seed_cash)
        .execute(&self.pool)
        .await?;

        let record = sqlx::query_as::<_, PortfolioRecord>(&format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Locks a user's portfolio row for the duration of the calling
    /// transaction, creating it with the seed balance on first access.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn lock_or_create(
        conn: &mut PgConnection,
        user_id: i64,
        seed_cash: Decimal,
    ) -> Result<PortfolioRecord> {
        let locked = sqlx::query_as::<_, PortfolioRecord>(&format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(record) = locked {
            return Ok(record);
        }

        sqlx::query(
            r"
            INSERT INTO portfolios (user_id, cash_balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(seed_cash)
        .execute(&mut *conn)
        .await?;

        let record = sqlx::query_as::<_, PortfolioRecord>(&format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Applies a cash delta and a realized-P&L delta in one statement.
    ///
    /// Callers must hold the portfolio row lock (`lock_or_create`).
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn apply_settlement(
        conn: &mut PgConnection,
        portfolio_id: i64,
        cash_delta: Decimal,
        realized_delta: Decimal,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE portfolios
            SET cash_balance = cash_balance + $1,
                realized_pnl = realized_pnl + $2,
                updated_at = now()
            WHERE id = $3
            ",
        )
        .bind(cash_delta)
        .bind(realized_delta)
        .bind(portfolio_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
