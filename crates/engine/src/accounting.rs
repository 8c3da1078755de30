//! Pure position-accounting arithmetic.
//!
//! Everything here is exact `Decimal` math; callers persist the results at
//! the storage layer's precision.

use rust_decimal::Decimal;

/// Weighted average acquisition cost after buying `add_qty` at `price` on top
/// of an existing `old_qty` at `old_avg`.
///
/// Callers guarantee `old_qty + add_qty > 0`.
#[must_use]
pub fn weighted_average(old_qty: i64, old_avg: Decimal, add_qty: i64, price: Decimal) -> Decimal {
    let total_qty = Decimal::from(old_qty + add_qty);
    (old_avg * Decimal::from(old_qty) + price * Decimal::from(add_qty)) / total_qty
}

/// Value and unrealized P&L of a long position at `current` price.
#[must_use]
pub fn position_valuation(
    quantity: i64,
    avg_price: Decimal,
    current: Decimal,
) -> (Decimal, Decimal) {
    let qty = Decimal::from(quantity);
    (current * qty, (current - avg_price) * qty)
}

/// P&L of a short contract at `current` price: profit when the price fell
/// below the open.
#[must_use]
pub fn short_pl(open_price: Decimal, current: Decimal, quantity: i64) -> Decimal {
    (open_price - current) * Decimal::from(quantity)
}

/// Notional value of `quantity` shares at `price`.
#[must_use]
pub fn notional(price: Decimal, quantity: i64) -> Decimal {
    price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // =========================================================================
    // Weighted Average Tests
    // =========================================================================

    #[test]
    fn test_weighted_average_first_buy_equals_price() {
        assert_eq!(weighted_average(0, dec!(0), 50, dec!(10.00)), dec!(10.00));
    }

    #[test]
    fn test_weighted_average_two_buys_exact() {
        // (10*10.00 + 20*13.00) / 30 = 360 / 30 = 12.00
        let avg = weighted_average(10, dec!(10.00), 20, dec!(13.00));
        assert_eq!(avg, dec!(12.00));
    }

    #[test]
    fn test_weighted_average_non_terminating_division_stays_close() {
        // (1*10.00 + 2*10.01) / 3 = 30.02 / 3
        let avg = weighted_average(1, dec!(10.00), 2, dec!(10.01));
        let reconstructed = avg * dec!(3);
        assert!((reconstructed - dec!(30.02)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_weighted_average_many_small_buys_does_not_drift() {
        // 100 buys of 1 share each at 0.10 must average exactly 0.10.
        let mut qty = 0;
        let mut avg = Decimal::ZERO;
        for _ in 0..100 {
            avg = weighted_average(qty, avg, 1, dec!(0.10));
            qty += 1;
        }
        assert_eq!(avg, dec!(0.10));
    }

    // =========================================================================
    // Valuation Tests
    // =========================================================================

    #[test]
    fn test_position_valuation() {
        let (value, unrealized) = position_valuation(50, dec!(10.00), dec!(12.00));
        assert_eq!(value, dec!(600.00));
        assert_eq!(unrealized, dec!(100.00));
    }

    #[test]
    fn test_position_valuation_loss() {
        let (value, unrealized) = position_valuation(10, dec!(20.00), dec!(15.00));
        assert_eq!(value, dec!(150.00));
        assert_eq!(unrealized, dec!(-50.00));
    }

    #[test]
    fn test_short_pl_profits_when_price_falls() {
        assert_eq!(short_pl(dec!(12.00), dec!(9.00), 10), dec!(30.00));
    }

    #[test]
    fn test_short_pl_loses_when_price_rises() {
        assert_eq!(short_pl(dec!(12.00), dec!(15.00), 10), dec!(-30.00));
    }

    #[test]
    fn test_notional() {
        assert_eq!(notional(dec!(9.50), 4), dec!(38.00));
    }
}
