//! Instrument repository.

use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::models::InstrumentRecord;

const INSTRUMENT_COLUMNS: &str = "id, institution_id, ticker, name, initial_price, \
     total_limit, per_user_limit, per_user_short_limit, active, created_at, updated_at";

/// Repository for instrument lookups.
#[derive(Debug, Clone)]
pub struct InstrumentRepository {
    pool: PgPool,
}

impl InstrumentRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets an instrument by ID within an institution.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(
        &self,
        stock_id: i64,
        institution_id: i64,
    ) -> Result<Option<InstrumentRecord>> {
        let record = sqlx::query_as::<_, InstrumentRecord>(&format!(
            "SELECT {INSTRUMENT_COLUMNS} FROM stocks WHERE id = $1 AND institution_id = $2"
        ))
        .bind(stock_id)
        .bind(institution_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists active instruments for an institution, ordered by ticker.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, institution_id: i64) -> Result<Vec<InstrumentRecord>> {
        let records = sqlx::query_as::<_, InstrumentRecord>(&format!(
            "SELECT {INSTRUMENT_COLUMNS} FROM stocks \
             WHERE institution_id = $1 AND active ORDER BY ticker"
        ))
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Transaction-scoped instrument lookup.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_tx(
        conn: &mut PgConnection,
        stock_id: i64,
        institution_id: i64,
    ) -> Result<Option<InstrumentRecord>> {
        let record = sqlx::query_as::<_, InstrumentRecord>(&format!(
            "SELECT {INSTRUMENT_COLUMNS} FROM stocks WHERE id = $1 AND institution_id = $2"
        ))
        .bind(stock_id)
        .bind(institution_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Bumps `updated_at`, keeping instrument freshness aligned with its
    /// latest price point.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn touch(conn: &mut PgConnection, stock_id: i64) -> Result<()> {
        sqlx::query("UPDATE stocks SET updated_at = now() WHERE id = $1")
            .bind(stock_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
