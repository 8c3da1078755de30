//! Short position data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One short contract: an obligation to return borrowed shares by expiry.
///
/// CFD-style, so opening credits no cash; profit or loss is realized only at
/// close. Multiple open rows may exist for the same (portfolio, instrument)
/// pair with different expiries; they are never merged. A partial close
/// reduces `quantity` in place, keeping the original `open_price` on the
/// remainder.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortPositionRecord {
    /// Auto-generated contract ID.
    pub id: i64,
    /// Owning portfolio.
    pub portfolio_id: i64,
    /// Shorted instrument.
    pub stock_id: i64,
    /// Open quantity; always positive while the row exists.
    pub quantity: i64,
    /// Price at open; P&L base for the whole contract.
    pub open_price: Decimal,
    /// Timestamp of open.
    pub opened_at: DateTime<Utc>,
    /// Requested lifetime in seconds.
    pub duration_seconds: i64,
    /// Deadline after which the expiry sweep force-closes the contract.
    pub expires_at: DateTime<Utc>,
    /// Set once; a closed contract never changes again.
    pub closed: bool,
    /// Price the contract closed at, once closed.
    pub close_price: Option<Decimal>,
    /// Timestamp of close, once closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl ShortPositionRecord {
    /// Returns true when the contract is past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// An open short joined with its instrument, as consumed by the snapshot
/// builder.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortHolding {
    pub short_id: i64,
    pub stock_id: i64,
    pub ticker: String,
    pub quantity: i64,
    pub open_price: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// A configurable short-duration menu entry for an institution.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortDurationOption {
    pub label: String,
    pub duration_seconds: i64,
}

impl ShortDurationOption {
    /// Built-in menu served when an institution has no custom entries.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                label: "1 Hour".to_string(),
                duration_seconds: 3600,
            },
            Self {
                label: "1 Day".to_string(),
                duration_seconds: 86_400,
            },
            Self {
                label: "1 Week".to_string(),
                duration_seconds: 604_800,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_is_expired_at_boundary() {
        let expiry = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let short = ShortPositionRecord {
            id: 1,
            portfolio_id: 1,
            stock_id: 1,
            quantity: 10,
            open_price: dec!(12.00),
            opened_at: expiry - chrono::Duration::hours(1),
            duration_seconds: 3600,
            expires_at: expiry,
            closed: false,
            close_price: None,
            closed_at: None,
        };

        assert!(!short.is_expired(expiry - chrono::Duration::seconds(1)));
        assert!(short.is_expired(expiry));
        assert!(short.is_expired(expiry + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_default_duration_menu_is_sorted() {
        let defaults = ShortDurationOption::defaults();
        assert_eq!(defaults.len(), 3);
        assert!(defaults
            .windows(2)
            .all(|pair| pair[0].duration_seconds < pair[1].duration_seconds));
    }
}
