//! Short-close allocation planner.
//!
//! Closing a quantity of shorts is all-or-nothing: availability is checked
//! against every open contract before any row is touched. Allocation walks
//! contracts soonest-expiry-first (oldest obligation first), closing each in
//! full until the remainder fits inside one contract, which is then reduced
//! in place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use stocksim_core::{TradeError, TradeResult};

use crate::accounting::short_pl;

/// One open contract as seen by the planner.
#[derive(Debug, Clone)]
pub struct ShortLot {
    pub id: i64,
    pub quantity: i64,
    pub open_price: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// How much of one contract a close consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseAllocation {
    /// Contract the quantity comes out of.
    pub short_id: i64,
    /// Quantity closed from this contract.
    pub quantity: i64,
    /// Quantity left open on this contract afterwards.
    pub remaining: i64,
}

/// The full allocation for one close request.
#[derive(Debug, Clone)]
pub struct ClosePlan {
    pub allocations: Vec<CloseAllocation>,
    /// Sum of `(open_price - close_price) * quantity` across allocations.
    pub realized_pl: Decimal,
}

/// Plans a close of `requested` shares at `close_price` against `lots`.
///
/// Lots are re-sorted soonest-expiry-first (id as tie-break) so callers do
/// not have to guarantee order.
///
/// # Errors
/// Returns `InsufficientShorts` when the open quantity across all lots is
/// less than `requested`; no allocation is produced in that case.
pub fn plan_close(lots: &[ShortLot], requested: i64, close_price: Decimal) -> TradeResult<ClosePlan> {
    if requested <= 0 {
        return Err(TradeError::invalid_input("close quantity must be positive"));
    }

    let open: i64 = lots.iter().map(|lot| lot.quantity).sum();
    if open < requested {
        return Err(TradeError::InsufficientShorts { requested, open });
    }

    let mut ordered: Vec<&ShortLot> = lots.iter().collect();
    ordered.sort_by_key(|lot| (lot.expires_at, lot.id));

    let mut remaining = requested;
    let mut allocations = Vec::new();
    let mut realized_pl = Decimal::ZERO;

    for lot in ordered {
        if remaining == 0 {
            break;
        }
        let take = lot.quantity.min(remaining);
        remaining -= take;
        realized_pl += short_pl(lot.open_price, close_price, take);
        allocations.push(CloseAllocation {
            short_id: lot.id,
            quantity: take,
            remaining: lot.quantity - take,
        });
    }

    Ok(ClosePlan {
        allocations,
        realized_pl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    fn lot(id: i64, quantity: i64, open_price: Decimal, expires_hour: u32) -> ShortLot {
        ShortLot {
            id,
            quantity,
            open_price,
            expires_at: at(expires_hour),
        }
    }

    // =========================================================================
    // Ordering Tests
    // =========================================================================

    #[test]
    fn test_soonest_expiry_closes_first() {
        // The later-expiring lot is listed first; the planner must still take
        // from the sooner one.
        let lots = vec![
            lot(2, 10, dec!(11.00), 18),
            lot(1, 10, dec!(12.00), 12),
        ];

        let plan = plan_close(&lots, 10, dec!(10.00)).unwrap();

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].short_id, 1);
        assert_eq!(plan.allocations[0].quantity, 10);
        assert_eq!(plan.allocations[0].remaining, 0);
        // Lot 2 untouched.
        assert_eq!(plan.realized_pl, dec!(20.00));
    }

    #[test]
    fn test_identical_expiry_breaks_tie_by_id() {
        let lots = vec![
            lot(9, 5, dec!(10.00), 12),
            lot(3, 5, dec!(10.00), 12),
        ];

        let plan = plan_close(&lots, 5, dec!(10.00)).unwrap();
        assert_eq!(plan.allocations[0].short_id, 3);
    }

    // =========================================================================
    // Allocation Tests
    // =========================================================================

    #[test]
    fn test_close_spans_multiple_lots() {
        let lots = vec![
            lot(1, 4, dec!(12.00), 12),
            lot(2, 10, dec!(11.00), 13),
        ];

        let plan = plan_close(&lots, 7, dec!(10.00)).unwrap();

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(
            plan.allocations[0],
            CloseAllocation {
                short_id: 1,
                quantity: 4,
                remaining: 0
            }
        );
        assert_eq!(
            plan.allocations[1],
            CloseAllocation {
                short_id: 2,
                quantity: 3,
                remaining: 7
            }
        );
        // (12-10)*4 + (11-10)*3 = 8 + 3
        assert_eq!(plan.realized_pl, dec!(11.00));
    }

    #[test]
    fn test_partial_close_keeps_remainder_open() {
        let lots = vec![lot(1, 10, dec!(12.00), 12)];

        let plan = plan_close(&lots, 4, dec!(13.50)).unwrap();

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].remaining, 6);
        // Loss: (12.00 - 13.50) * 4
        assert_eq!(plan.realized_pl, dec!(-6.00));
    }

    #[test]
    fn test_exact_full_close_of_everything() {
        let lots = vec![
            lot(1, 3, dec!(10.00), 12),
            lot(2, 7, dec!(10.00), 13),
        ];

        let plan = plan_close(&lots, 10, dec!(9.00)).unwrap();
        assert_eq!(plan.allocations.len(), 2);
        assert!(plan.allocations.iter().all(|a| a.remaining == 0));
        assert_eq!(plan.realized_pl, dec!(10.00));
    }

    // =========================================================================
    // Rejection Tests
    // =========================================================================

    #[test]
    fn test_over_close_is_rejected_without_allocation() {
        let lots = vec![
            lot(1, 3, dec!(10.00), 12),
            lot(2, 4, dec!(10.00), 13),
        ];

        let err = plan_close(&lots, 8, dec!(9.00)).unwrap_err();
        assert!(matches!(
            err,
            TradeError::InsufficientShorts {
                requested: 8,
                open: 7
            }
        ));
    }

    #[test]
    fn test_close_with_no_open_lots_is_rejected() {
        let err = plan_close(&[], 1, dec!(9.00)).unwrap_err();
        assert!(matches!(
            err,
            TradeError::InsufficientShorts {
                requested: 1,
                open: 0
            }
        ));
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        let lots = vec![lot(1, 3, dec!(10.00), 12)];
        assert!(matches!(
            plan_close(&lots, 0, dec!(9.00)),
            Err(TradeError::InvalidInput(_))
        ));
    }
}
