//! End-to-end scenarios over the pure accounting layer: the arithmetic a
//! full trade round-trip settles with, exercised through the public API.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use stocksim_engine::{plan_close, position_valuation, short_pl, weighted_average, ShortLot};

fn lot(id: i64, quantity: i64, open_price: rust_decimal::Decimal, hour: u32) -> ShortLot {
    ShortLot {
        id,
        quantity,
        open_price,
        expires_at: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
    }
}

#[test]
fn buy_then_sell_at_same_price_conserves_cash() {
    // buy 50 @ 10.00 out of 1000.00 cash, then sell 50 @ 10.00
    let mut cash = dec!(1000.00);
    let price = dec!(10.00);
    let quantity = 50;

    let cost = price * rust_decimal::Decimal::from(quantity);
    cash -= cost;
    assert_eq!(cash, dec!(500.00));

    let proceeds = price * rust_decimal::Decimal::from(quantity);
    cash += proceeds;
    assert_eq!(cash, dec!(1000.00));
}

#[test]
fn buy_sell_round_trip_with_price_move() {
    // Scenario from the portfolio walkthrough: 1000.00 cash, instrument seeded
    // at 10.00 with no history. Buy 50, price moves to 12.00, sell 50.
    let mut cash = dec!(1000.00);

    let buy_price = dec!(10.00);
    cash -= buy_price * dec!(50);
    assert_eq!(cash, dec!(500.00));
    let avg = weighted_average(0, dec!(0), 50, buy_price);
    assert_eq!(avg, dec!(10.00));

    let sell_price = dec!(12.00);
    let (value, unrealized) = position_valuation(50, avg, sell_price);
    assert_eq!(value, dec!(600.00));
    assert_eq!(unrealized, dec!(100.00));

    cash += sell_price * dec!(50);
    assert_eq!(cash, dec!(1100.00));
}

#[test]
fn expiry_sweep_realizes_short_profit() {
    // openShort(10, 3600) at 12.00; swept at 9.00 → PL = 30.00.
    let pl = short_pl(dec!(12.00), dec!(9.00), 10);
    assert_eq!(pl, dec!(30.00));

    let mut cash = dec!(1000.00);
    cash += pl;
    assert_eq!(cash, dec!(1030.00));
}

#[test]
fn close_satisfied_by_soonest_contract_leaves_later_one_untouched() {
    // Two shorts with expiries T1 < T2; closing a quantity the first contract
    // covers alone must not touch the second.
    let lots = vec![
        lot(1, 10, dec!(12.00), 10),
        lot(2, 10, dec!(12.00), 16),
    ];

    let plan = plan_close(&lots, 10, dec!(11.00)).expect("close should fit");

    assert_eq!(plan.allocations.len(), 1);
    assert_eq!(plan.allocations[0].short_id, 1);
    assert_eq!(plan.allocations[0].remaining, 0);
    assert_eq!(plan.realized_pl, dec!(10.00));
}

#[test]
fn over_close_rejects_before_any_allocation() {
    let lots = vec![lot(1, 5, dec!(12.00), 10), lot(2, 5, dec!(12.00), 16)];

    let err = plan_close(&lots, 11, dec!(11.00)).unwrap_err();
    assert_eq!(err.code(), "insufficient_shorts");
}

#[test]
fn realized_pl_is_exact_per_contract() {
    // Sum of realized cash effects must equal (open - close) * quantity per
    // contract with no rounding drift.
    let lots = vec![
        lot(1, 3, dec!(12.34), 10),
        lot(2, 4, dec!(11.11), 11),
    ];

    let plan = plan_close(&lots, 7, dec!(10.05)).unwrap();

    let expected = (dec!(12.34) - dec!(10.05)) * dec!(3) + (dec!(11.11) - dec!(10.05)) * dec!(4);
    assert_eq!(plan.realized_pl, expected);
    assert_eq!(plan.realized_pl, dec!(11.11));
}
