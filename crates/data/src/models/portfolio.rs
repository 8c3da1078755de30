//! Portfolio data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One user's cash balance and realized P&L.
///
/// Auto-created on first access with the configured seed balance. The cash
/// balance only moves inside the engine's transactional trade units.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PortfolioRecord {
    /// Auto-generated portfolio ID.
    pub id: i64,
    /// Owning user (unique).
    pub user_id: i64,
    /// Virtual cash available for buys.
    pub cash_balance: Decimal,
    /// Running total of P&L locked in by SELL and SHORT_CLOSE trades.
    pub realized_pnl: Decimal,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last cash movement.
    pub updated_at: DateTime<Utc>,
}

impl PortfolioRecord {
    /// Returns true when the portfolio can cover `cost`.
    #[must_use]
    pub fn can_afford(&self, cost: Decimal) -> bool {
        self.cash_balance >= cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample() -> PortfolioRecord {
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        PortfolioRecord {
            id: 1,
            user_id: 42,
            cash_balance: dec!(1000.00),
            realized_pnl: dec!(0),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_can_afford_boundary() {
        let portfolio = sample();
        assert!(portfolio.can_afford(dec!(1000.00)));
        assert!(portfolio.can_afford(dec!(999.99)));
        assert!(!portfolio.can_afford(dec!(1000.01)));
    }
}
