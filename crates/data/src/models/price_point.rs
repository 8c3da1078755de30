//! Price ledger data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One append-only point in an instrument's price series.
///
/// Ties on `recorded_at` are broken by `id` (insertion order), so the latest
/// price is well defined at sub-second write rates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PricePointRecord {
    /// Auto-generated point ID; secondary sort key.
    pub id: i64,
    /// Instrument the point belongs to.
    pub stock_id: i64,
    /// Recorded price; always positive.
    pub price: Decimal,
    /// Server-assigned timestamp.
    pub recorded_at: DateTime<Utc>,
}
