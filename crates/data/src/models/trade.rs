//! Trade record data model.
//!
//! Trades are write-once: the table is both the audit log and the activity
//! feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four actions a trade row can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    /// Long buy; debits cash.
    Buy,
    /// Long sell; credits cash.
    Sell,
    /// Short open; no cash effect.
    ShortOpen,
    /// Short close (user-initiated or expiry sweep); settles realized P&L.
    ShortClose,
}

impl TradeKind {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::ShortOpen => "SHORT_OPEN",
            Self::ShortClose => "SHORT_CLOSE",
        }
    }

    /// Parses from the stored string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "SHORT_OPEN" => Some(Self::ShortOpen),
            "SHORT_CLOSE" => Some(Self::ShortClose),
            _ => None,
        }
    }
}

/// An immutable record of one executed action.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeRecord {
    /// Auto-generated trade ID.
    pub id: i64,
    /// Portfolio the action settled against.
    pub portfolio_id: i64,
    /// Instrument traded.
    pub stock_id: i64,
    /// Action kind: "BUY", "SELL", "SHORT_OPEN", "SHORT_CLOSE".
    pub kind: String,
    /// Quantity the caller requested (for multi-row short closes this is the
    /// requested total, not a per-contract breakdown).
    pub quantity: i64,
    /// Execution price.
    pub price: Decimal,
    /// Server-assigned timestamp.
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Returns the parsed trade kind.
    #[must_use]
    pub fn parsed_kind(&self) -> Option<TradeKind> {
        TradeKind::parse(&self.kind)
    }
}

/// One activity-feed entry: a trade joined with its instrument.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub trade_id: i64,
    pub stock_id: i64,
    pub ticker: String,
    pub name: String,
    pub kind: String,
    pub quantity: i64,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_kind_roundtrip() {
        for kind in [
            TradeKind::Buy,
            TradeKind::Sell,
            TradeKind::ShortOpen,
            TradeKind::ShortClose,
        ] {
            assert_eq!(TradeKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_trade_kind_rejects_unknown() {
        assert_eq!(TradeKind::parse("MARGIN_CALL"), None);
        assert_eq!(TradeKind::parse("buy"), None);
    }
}
