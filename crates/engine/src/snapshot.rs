//! Portfolio snapshot builder.
//!
//! A pure read: nothing here mutates, and valuation is recomputed from the
//! price ledger on every call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stocksim_core::TradeResult;
use stocksim_data::models::{PositionHolding, ShortHolding};

use crate::accounting::{notional, position_valuation, short_pl};
use crate::executor::TradeEngine;

/// One long holding, valued at the current price.
#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub stock_id: i64,
    pub ticker: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    pub position_value: Decimal,
    pub unrealized_pl: Decimal,
}

/// One open short contract, marked at the current price.
#[derive(Debug, Clone, Serialize)]
pub struct ShortView {
    pub short_id: i64,
    pub stock_id: i64,
    pub ticker: String,
    pub quantity: i64,
    pub open_price: Decimal,
    pub current_price: Decimal,
    pub expires_at: DateTime<Utc>,
    pub pl: Decimal,
}

/// Aggregate totals over the whole portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotTotals {
    /// Cash + long value − open short notional at current prices.
    pub portfolio_value: Decimal,
    /// Paper P&L across longs and open shorts.
    pub unrealized: Decimal,
    /// Running total locked in by SELL and SHORT_CLOSE trades.
    pub realized: Decimal,
}

/// The full read view a client needs for one portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub cash_balance: Decimal,
    pub positions: Vec<PositionView>,
    pub shorts: Vec<ShortView>,
    pub totals: SnapshotTotals,
}

impl TradeEngine {
    /// Builds the current snapshot for a user's portfolio, auto-creating the
    /// portfolio with the seed balance on first access.
    ///
    /// # Errors
    /// Returns `Storage`/`Internal` on database failure.
    pub async fn portfolio_snapshot(
        &self,
        user_id: i64,
        institution_id: i64,
    ) -> TradeResult<PortfolioSnapshot> {
        let repos = self.repos();
        let portfolio = repos
            .portfolios
            .get_or_create(user_id, self.config().seed_cash)
            .await?;
        let holdings = repos
            .positions
            .holdings(portfolio.id, institution_id)
            .await?;
        let shorts = repos
            .shorts
            .open_for_portfolio(portfolio.id, institution_id)
            .await?;

        let mut stock_ids: Vec<i64> = holdings
            .iter()
            .map(|h| h.stock_id)
            .chain(shorts.iter().map(|s| s.stock_id))
            .collect();
        stock_ids.sort_unstable();
        stock_ids.dedup();
        let prices = repos.prices.latest_for_stocks(&stock_ids).await?;

        Ok(assemble(
            portfolio.cash_balance,
            portfolio.realized_pnl,
            holdings,
            shorts,
            &prices,
        ))
    }
}

/// Combines raw rows into the snapshot. Long positions with no quote fall
/// back to their average price, shorts to their open price.
fn assemble(
    cash_balance: Decimal,
    realized: Decimal,
    holdings: Vec<PositionHolding>,
    shorts: Vec<ShortHolding>,
    prices: &HashMap<i64, Decimal>,
) -> PortfolioSnapshot {
    let mut portfolio_value = cash_balance;
    let mut unrealized = Decimal::ZERO;

    let positions: Vec<PositionView> = holdings
        .into_iter()
        .map(|holding| {
            let current = prices
                .get(&holding.stock_id)
                .copied()
                .unwrap_or(holding.avg_price);
            let (position_value, unrealized_pl) =
                position_valuation(holding.quantity, holding.avg_price, current);
            portfolio_value += position_value;
            unrealized += unrealized_pl;
            PositionView {
                stock_id: holding.stock_id,
                ticker: holding.ticker,
                name: holding.name,
                quantity: holding.quantity,
                avg_price: holding.avg_price,
                current_price: current,
                position_value,
                unrealized_pl,
            }
        })
        .collect();

    let shorts: Vec<ShortView> = shorts
        .into_iter()
        .map(|short| {
            let current = prices
                .get(&short.stock_id)
                .copied()
                .unwrap_or(short.open_price);
            let pl = short_pl(short.open_price, current, short.quantity);
            portfolio_value -= notional(current, short.quantity);
            unrealized += pl;
            ShortView {
                short_id: short.short_id,
                stock_id: short.stock_id,
                ticker: short.ticker,
                quantity: short.quantity,
                open_price: short.open_price,
                current_price: current,
                expires_at: short.expires_at,
                pl,
            }
        })
        .collect();

    PortfolioSnapshot {
        cash_balance,
        positions,
        shorts,
        totals: SnapshotTotals {
            portfolio_value,
            unrealized,
            realized,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn holding(stock_id: i64, quantity: i64, avg_price: Decimal) -> PositionHolding {
        PositionHolding {
            stock_id,
            ticker: format!("T{stock_id}"),
            name: format!("Stock {stock_id}"),
            quantity,
            avg_price,
        }
    }

    fn short(short_id: i64, stock_id: i64, quantity: i64, open_price: Decimal) -> ShortHolding {
        ShortHolding {
            short_id,
            stock_id,
            ticker: format!("T{stock_id}"),
            quantity,
            open_price,
            expires_at: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
        }
    }

    // =========================================================================
    // Assembly Tests
    // =========================================================================

    #[test]
    fn test_cash_only_snapshot() {
        let snapshot = assemble(
            dec!(1000.00),
            dec!(0),
            vec![],
            vec![],
            &HashMap::new(),
        );

        assert_eq!(snapshot.cash_balance, dec!(1000.00));
        assert_eq!(snapshot.totals.portfolio_value, dec!(1000.00));
        assert_eq!(snapshot.totals.unrealized, dec!(0));
        assert_eq!(snapshot.totals.realized, dec!(0));
    }

    #[test]
    fn test_position_valued_at_current_price() {
        let prices = HashMap::from([(1, dec!(12.00))]);
        let snapshot = assemble(
            dec!(500.00),
            dec!(0),
            vec![holding(1, 50, dec!(10.00))],
            vec![],
            &prices,
        );

        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.positions[0].position_value, dec!(600.00));
        assert_eq!(snapshot.positions[0].unrealized_pl, dec!(100.00));
        // 500 cash + 600 position value
        assert_eq!(snapshot.totals.portfolio_value, dec!(1100.00));
        assert_eq!(snapshot.totals.unrealized, dec!(100.00));
    }

    #[test]
    fn test_position_without_quote_falls_back_to_avg() {
        let snapshot = assemble(
            dec!(0),
            dec!(0),
            vec![holding(1, 10, dec!(25.00))],
            vec![],
            &HashMap::new(),
        );

        assert_eq!(snapshot.positions[0].current_price, dec!(25.00));
        assert_eq!(snapshot.positions[0].unrealized_pl, dec!(0.00));
        assert_eq!(snapshot.totals.portfolio_value, dec!(250.00));
    }

    #[test]
    fn test_short_reduces_portfolio_value_by_notional() {
        let prices = HashMap::from([(1, dec!(9.00))]);
        let snapshot = assemble(
            dec!(1000.00),
            dec!(0),
            vec![],
            vec![short(7, 1, 10, dec!(12.00))],
            &prices,
        );

        assert_eq!(snapshot.shorts.len(), 1);
        // (12 - 9) * 10 = 30 paper profit
        assert_eq!(snapshot.shorts[0].pl, dec!(30.00));
        // 1000 cash - 90 short notional
        assert_eq!(snapshot.totals.portfolio_value, dec!(910.00));
        assert_eq!(snapshot.totals.unrealized, dec!(30.00));
    }

    #[test]
    fn test_short_without_quote_marks_at_open_price() {
        let snapshot = assemble(
            dec!(100.00),
            dec!(0),
            vec![],
            vec![short(7, 1, 5, dec!(8.00))],
            &HashMap::new(),
        );

        assert_eq!(snapshot.shorts[0].current_price, dec!(8.00));
        assert_eq!(snapshot.shorts[0].pl, dec!(0.00));
        assert_eq!(snapshot.totals.portfolio_value, dec!(60.00));
    }

    #[test]
    fn test_mixed_portfolio_totals() {
        let prices = HashMap::from([(1, dec!(12.00)), (2, dec!(4.00))]);
        let snapshot = assemble(
            dec!(200.00),
            dec!(55.00),
            vec![holding(1, 10, dec!(10.00))],
            vec![short(3, 2, 20, dec!(5.00))],
            &prices,
        );

        // 200 cash + 120 long value - 80 short notional
        assert_eq!(snapshot.totals.portfolio_value, dec!(240.00));
        // 20 long + 20 short
        assert_eq!(snapshot.totals.unrealized, dec!(40.00));
        assert_eq!(snapshot.totals.realized, dec!(55.00));
    }
}
