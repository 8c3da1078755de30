//! Instrument (stock) data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradable instrument scoped to one institution.
///
/// Instruments are never hard-deleted; deactivation keeps history visible
/// while rejecting new trades and new price points.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InstrumentRecord {
    /// Auto-generated instrument ID.
    pub id: i64,
    /// Owning institution.
    pub institution_id: i64,
    /// Short ticker symbol, unique per institution.
    pub ticker: String,
    /// Display name.
    pub name: String,
    /// Seed price used until the first price point is recorded.
    pub initial_price: Decimal,
    /// Cap on total shares held across all portfolios, if any.
    pub total_limit: Option<i64>,
    /// Cap on shares held by a single portfolio, if any.
    pub per_user_limit: Option<i64>,
    /// Cap on open short quantity per portfolio, if any.
    pub per_user_short_limit: Option<i64>,
    /// Whether new trades are accepted.
    pub active: bool,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last manager update or price record.
    pub updated_at: DateTime<Utc>,
}

/// One row of the institution's quote board: an active instrument plus its
/// latest and previous prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteBoardRow {
    pub stock_id: i64,
    pub ticker: String,
    pub name: String,
    pub initial_price: Decimal,
    /// Latest recorded price, if any point exists.
    pub current_price: Option<Decimal>,
    /// Price one step back, if at least two points exist.
    pub previous_price: Option<Decimal>,
}

impl QuoteBoardRow {
    /// The effective current price (latest point or the initial price).
    #[must_use]
    pub fn current(&self) -> Decimal {
        self.current_price.unwrap_or(self.initial_price)
    }

    /// Base the change is measured against: the previous point, or the
    /// initial price when fewer than two points exist.
    #[must_use]
    pub fn change_base(&self) -> Decimal {
        self.previous_price.unwrap_or(self.initial_price)
    }

    /// Absolute change since the previous price.
    #[must_use]
    pub fn change(&self) -> Decimal {
        self.current() - self.change_base()
    }

    /// Percentage change since the previous price; 0 when the base is 0.
    #[must_use]
    pub fn change_pct(&self) -> Decimal {
        let base = self.change_base();
        if base.is_zero() {
            Decimal::ZERO
        } else {
            self.change() / base * Decimal::ONE_HUNDRED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(current: Option<Decimal>, previous: Option<Decimal>) -> QuoteBoardRow {
        QuoteBoardRow {
            stock_id: 1,
            ticker: "ACME".to_string(),
            name: "Acme Corp".to_string(),
            initial_price: dec!(10.00),
            current_price: current,
            previous_price: previous,
        }
    }

    #[test]
    fn test_quote_with_no_points_uses_initial_price() {
        let quote = row(None, None);
        assert_eq!(quote.current(), dec!(10.00));
        assert_eq!(quote.change(), dec!(0.00));
        assert_eq!(quote.change_pct(), dec!(0));
    }

    #[test]
    fn test_quote_with_one_point_measures_against_initial() {
        let quote = row(Some(dec!(12.00)), None);
        assert_eq!(quote.current(), dec!(12.00));
        assert_eq!(quote.change(), dec!(2.00));
        assert_eq!(quote.change_pct(), dec!(20.00));
    }

    #[test]
    fn test_quote_with_two_points_measures_against_previous() {
        let quote = row(Some(dec!(9.00)), Some(dec!(12.00)));
        assert_eq!(quote.change(), dec!(-3.00));
        assert_eq!(quote.change_pct(), dec!(-25.00));
    }

    #[test]
    fn test_quote_zero_base_has_zero_percentage() {
        let mut quote = row(Some(dec!(5.00)), None);
        quote.initial_price = Decimal::ZERO;
        assert_eq!(quote.change_pct(), Decimal::ZERO);
    }
}
