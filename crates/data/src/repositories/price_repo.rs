//! Price ledger repository.
//!
//! Owns every "latest price" query in the system. Latest-point lookups order
//! by `(recorded_at DESC, id DESC)` so insertion order breaks timestamp ties.

use std::collections::HashMap;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::PricePointRecord;

/// Repository for the append-only price series.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a price point with a server-assigned timestamp.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn record(
        conn: &mut PgConnection,
        stock_id: i64,
        price: Decimal,
    ) -> Result<PricePointRecord> {
        let record = sqlx::query_as::<_, PricePointRecord>(
            r"
            INSERT INTO stock_prices (stock_id, price)
            VALUES ($1, $2)
            RETURNING id, stock_id, price, recorded_at
            ",
        )
        .bind(stock_id)
        .bind(price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Latest recorded price within the calling transaction, if any point
    /// exists.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn current_price_tx(
        conn: &mut PgConnection,
        stock_id: i64,
    ) -> Result<Option<Decimal>> {
        let price = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT price FROM stock_prices
            WHERE stock_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(stock_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(price)
    }

    /// Latest recorded price, if any point exists.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn current_price(&self, stock_id: i64) -> Result<Option<Decimal>> {
        let price = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT price FROM stock_prices
            WHERE stock_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(stock_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(price)
    }

    /// Most-recent-first price history, bounded by `limit`.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn history(&self, stock_id: i64, limit: i64) -> Result<Vec<PricePointRecord>> {
        let records = sqlx::query_as::<_, PricePointRecord>(
            r"
            SELECT id, stock_id, price, recorded_at
            FROM stock_prices
            WHERE stock_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(stock_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The two most recent prices, newest first. Feeds change-since-last
    /// computations.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn latest_two(&self, stock_id: i64) -> Result<Vec<Decimal>> {
        let prices = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT price FROM stock_prices
            WHERE stock_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 2
            ",
        )
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prices)
    }

    /// Latest price per instrument for a batch of instruments.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn latest_for_stocks(&self, stock_ids: &[i64]) -> Result<HashMap<i64, Decimal>> {
        if stock_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, Decimal)> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (stock_id) stock_id, price
            FROM stock_prices
            WHERE stock_id = ANY($1)
            ORDER BY stock_id, recorded_at DESC, id DESC
            ",
        )
        .bind(stock_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Latest and previous price per instrument for a batch of instruments.
    ///
    /// Returns `(current, previous)` pairs; `previous` is `None` when fewer
    /// than two points exist.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn latest_pairs(
        &self,
        stock_ids: &[i64],
    ) -> Result<HashMap<i64, (Decimal, Option<Decimal>)>> {
        if stock_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, Decimal, i64)> = sqlx::query_as(
            r"
            SELECT stock_id, price, rn FROM (
                SELECT stock_id, price,
                       row_number() OVER (
                           PARTITION BY stock_id
                           ORDER BY recorded_at DESC, id DESC
                       ) AS rn
                FROM stock_prices
                WHERE stock_id = ANY($1)
            ) ranked
            WHERE rn <= 2
            ORDER BY stock_id, rn
            ",
        )
        .bind(stock_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut pairs: HashMap<i64, (Decimal, Option<Decimal>)> = HashMap::new();
        for (stock_id, price, rn) in rows {
            if rn == 1 {
                pairs.insert(stock_id, (price, None));
            } else if let Some(entry) = pairs.get_mut(&stock_id) {
                entry.1 = Some(price);
            }
        }

        Ok(pairs)
    }
}
