//! Trade record repository.
//!
//! Trades are insert-only; there is no update or delete path.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::{ActivityRow, TradeKind, TradeRecord};

/// Repository for the immutable trade log.
#[derive(Debug, Clone)]
pub struct TradeRepository {
    pool: PgPool,
}

impl TradeRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends one trade row and returns it.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(
        conn: &mut PgConnection,
        portfolio_id: i64,
        stock_id: i64,
        kind: TradeKind,
        quantity: i64,
        price: Decimal,
    ) -> Result<TradeRecord> {
        let record = sqlx::query_as::<_, TradeRecord>(
            r"
            INSERT INTO trades (portfolio_id, stock_id, kind, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, portfolio_id, stock_id, kind, quantity, price, created_at
            ",
        )
        .bind(portfolio_id)
        .bind(stock_id)
        .bind(kind.as_str())
        .bind(quantity)
        .bind(price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// A user's recent trades joined with their instruments, newest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn recent_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityRow>> {
        let records = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT t.id AS trade_id, t.stock_id, s.ticker, s.name,
                   t.kind, t.quantity, t.price, t.created_at
            FROM trades t
            JOIN portfolios p ON p.id = t.portfolio_id
            JOIN stocks s ON s.id = t.stock_id
            WHERE p.user_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
