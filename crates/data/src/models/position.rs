//! Long position data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A long holding of an instrument by a portfolio.
///
/// At most one row per (portfolio, instrument); the row is deleted when the
/// quantity reaches exactly zero, so no zero-quantity rows persist.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PositionRecord {
    /// Auto-generated position ID.
    pub id: i64,
    /// Owning portfolio.
    pub portfolio_id: i64,
    /// Held instrument.
    pub stock_id: i64,
    /// Shares held; always positive while the row exists.
    pub quantity: i64,
    /// Weighted average acquisition cost.
    pub avg_price: Decimal,
    /// Timestamp of the first buy.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last quantity change.
    pub updated_at: DateTime<Utc>,
}

/// A position joined with its instrument, as consumed by the snapshot
/// builder.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PositionHolding {
    pub stock_id: i64,
    pub ticker: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: Decimal,
}
