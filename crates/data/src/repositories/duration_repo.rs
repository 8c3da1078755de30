//! Short-duration menu repository.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::ShortDurationOption;

/// Repository for the per-institution short-duration menu.
#[derive(Debug, Clone)]
pub struct DurationRepository {
    pool: PgPool,
}

impl DurationRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The institution's configured duration menu, shortest first, or the
    /// built-in defaults when none are configured.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn options(&self, institution_id: i64) -> Result<Vec<ShortDurationOption>> {
        let records = sqlx::query_as::<_, ShortDurationOption>(
            r"
            SELECT label, duration_seconds
            FROM short_duration_options
            WHERE institution_id = $1
            ORDER BY duration_seconds ASC
            ",
        )
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        if records.is_empty() {
            return Ok(ShortDurationOption::defaults());
        }

        Ok(records)
    }
}
