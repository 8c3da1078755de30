use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Embedded DDL, applied statement by statement.
const SCHEMA_SQL: &str = include_str!("../schema.sql");

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Returns a clone of the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Applies the embedded schema. Every statement is `IF NOT EXISTS`, so
    /// this is safe to run on every startup.
    ///
    /// # Errors
    /// Returns an error if any DDL statement fails.
    pub async fn init_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA_SQL.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::info!("database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_contains_all_core_tables() {
        for table in [
            "stocks",
            "stock_prices",
            "portfolios",
            "positions",
            "short_positions",
            "trades",
            "short_duration_options",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "schema is missing table {table}"
            );
        }
    }

    #[test]
    fn test_schema_statements_are_splittable() {
        let statements: Vec<_> = SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert!(statements.len() >= 7);
        for statement in statements {
            assert!(
                statement.starts_with("CREATE TABLE")
                    || statement.starts_with("CREATE INDEX")
                    || statement.starts_with("--"),
                "unexpected statement start: {statement}"
            );
        }
    }
}
