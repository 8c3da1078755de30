//! The transactional trade execution engine.
//!
//! Every mutating operation runs as one database transaction: the portfolio
//! row is locked first, then the affected position/short rows, so trades
//! against the same portfolio serialize and a failure at any step rolls the
//! whole unit back. Dropping the transaction without commit is the rollback
//! path — no partial debit, no orphaned trade row.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use stocksim_core::{SimulationConfig, TradeError, TradeResult};
use stocksim_data::models::{InstrumentRecord, PricePointRecord, TradeKind};
use stocksim_data::repositories::{
    InstrumentRepository, PortfolioRepository, PositionRepository, PriceRepository, Repositories,
    ShortRepository, TradeRepository,
};

use crate::accounting::{notional, short_pl, weighted_average};
use crate::close_plan::{plan_close, ShortLot};

/// Result of a buy or sell.
#[derive(Debug, Clone, Serialize)]
pub struct TradeReceipt {
    pub stock_id: i64,
    pub quantity: i64,
    /// Execution price (current price at lock acquisition).
    pub price: Decimal,
    /// Cost of a buy, proceeds of a sell.
    pub total: Decimal,
}

/// Result of opening a short contract.
#[derive(Debug, Clone, Serialize)]
pub struct ShortOpenReceipt {
    pub short_id: i64,
    pub stock_id: i64,
    pub quantity: i64,
    pub open_price: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// Result of a user-initiated short close. One receipt covers the whole
/// request even when several contracts were consumed.
#[derive(Debug, Clone, Serialize)]
pub struct ShortCloseReceipt {
    pub stock_id: i64,
    pub quantity: i64,
    pub close_price: Decimal,
    /// Negative when the close locked in a loss.
    pub realized_pl: Decimal,
}

/// One contract force-closed by the expiry sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweptShort {
    pub short_id: i64,
    pub portfolio_id: i64,
    pub stock_id: i64,
    pub quantity: i64,
    pub close_price: Decimal,
    pub realized_pl: Decimal,
}

/// Transactional orchestrator over the storage layer.
pub struct TradeEngine {
    pool: PgPool,
    repos: Repositories,
    config: SimulationConfig,
}

impl TradeEngine {
    /// Creates an engine over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool, config: SimulationConfig) -> Self {
        Self {
            repos: Repositories::new(pool.clone()),
            pool,
            config,
        }
    }

    pub(crate) fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub(crate) fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Buys `quantity` shares at the current price.
    ///
    /// # Errors
    /// `InvalidInput`, `InstrumentNotFound`, `InsufficientCash`, or
    /// `LimitExceeded`; all leave the database untouched.
    pub async fn buy(
        &self,
        user_id: i64,
        institution_id: i64,
        stock_id: i64,
        quantity: i64,
    ) -> TradeResult<TradeReceipt> {
        ensure_positive(quantity, "quantity")?;
        debug!(user_id, stock_id, quantity, "buy requested");

        let mut tx = self.pool.begin().await?;
        let portfolio =
            PortfolioRepository::lock_or_create(&mut tx, user_id, self.config.seed_cash).await?;
        let stock = active_instrument(&mut tx, stock_id, institution_id).await?;
        let price = current_price(&mut tx, &stock).await?;

        let cost = notional(price, quantity);
        if portfolio.cash_balance < cost {
            return Err(TradeError::InsufficientCash {
                required: cost,
                available: portfolio.cash_balance,
            });
        }

        let position = PositionRepository::lock(&mut tx, portfolio.id, stock_id).await?;
        let held = position.as_ref().map_or(0, |p| p.quantity);
        let new_quantity = held + quantity;
        if let Some(max) = stock.per_user_limit {
            if new_quantity > max {
                return Err(TradeError::LimitExceeded {
                    limit: "per-user",
                    attempted: new_quantity,
                    max,
                });
            }
        }
        if let Some(max) = stock.total_limit {
            let held_total = PositionRepository::total_held(&mut tx, stock_id).await?;
            if held_total + quantity > max {
                return Err(TradeError::LimitExceeded {
                    limit: "total",
                    attempted: held_total + quantity,
                    max,
                });
            }
        }

        match position {
            Some(pos) => {
                let avg = weighted_average(pos.quantity, pos.avg_price, quantity, price);
                PositionRepository::set_quantity_and_avg(&mut tx, pos.id, new_quantity, avg)
                    .await?;
            }
            None => {
                PositionRepository::insert(&mut tx, portfolio.id, stock_id, quantity, price)
                    .await?;
            }
        }

        PortfolioRepository::apply_settlement(&mut tx, portfolio.id, -cost, Decimal::ZERO).await?;
        TradeRepository::insert(&mut tx, portfolio.id, stock_id, TradeKind::Buy, quantity, price)
            .await?;
        tx.commit().await?;

        info!(user_id, stock_id, quantity, %price, "buy executed");
        Ok(TradeReceipt {
            stock_id,
            quantity,
            price,
            total: cost,
        })
    }

    /// Sells `quantity` shares at the current price.
    ///
    /// # Errors
    /// `InvalidInput`, `InstrumentNotFound`, or `InsufficientShares`; all
    /// leave the database untouched.
    pub async fn sell(
        &self,
        user_id: i64,
        institution_id: i64,
        stock_id: i64,
        quantity: i64,
    ) -> TradeResult<TradeReceipt> {
        ensure_positive(quantity, "quantity")?;
        debug!(user_id, stock_id, quantity, "sell requested");

        let mut tx = self.pool.begin().await?;
        let portfolio =
            PortfolioRepository::lock_or_create(&mut tx, user_id, self.config.seed_cash).await?;
        let stock = active_instrument(&mut tx, stock_id, institution_id).await?;
        let price = current_price(&mut tx, &stock).await?;

        let position = PositionRepository::lock(&mut tx, portfolio.id, stock_id).await?;
        let Some(pos) = position else {
            return Err(TradeError::InsufficientShares {
                requested: quantity,
                held: 0,
            });
        };
        if pos.quantity < quantity {
            return Err(TradeError::InsufficientShares {
                requested: quantity,
                held: pos.quantity,
            });
        }

        let remaining = pos.quantity - quantity;
        if remaining == 0 {
            PositionRepository::delete(&mut tx, pos.id).await?;
        } else {
            PositionRepository::set_quantity(&mut tx, pos.id, remaining).await?;
        }

        let proceeds = notional(price, quantity);
        let realized = (price - pos.avg_price) * Decimal::from(quantity);
        PortfolioRepository::apply_settlement(&mut tx, portfolio.id, proceeds, realized).await?;
        TradeRepository::insert(&mut tx, portfolio.id, stock_id, TradeKind::Sell, quantity, price)
            .await?;
        tx.commit().await?;

        info!(user_id, stock_id, quantity, %price, "sell executed");
        Ok(TradeReceipt {
            stock_id,
            quantity,
            price,
            total: proceeds,
        })
    }

    /// Opens a short contract at the current price. No cash moves at open.
    ///
    /// # Errors
    /// `InvalidInput`, `InstrumentNotFound`, or `LimitExceeded`; all leave
    /// the database untouched.
    pub async fn open_short(
        &self,
        user_id: i64,
        institution_id: i64,
        stock_id: i64,
        quantity: i64,
        duration_seconds: i64,
    ) -> TradeResult<ShortOpenReceipt> {
        ensure_positive(quantity, "quantity")?;
        ensure_positive(duration_seconds, "duration")?;
        debug!(user_id, stock_id, quantity, duration_seconds, "short open requested");

        let mut tx = self.pool.begin().await?;
        let portfolio =
            PortfolioRepository::lock_or_create(&mut tx, user_id, self.config.seed_cash).await?;
        let stock = active_instrument(&mut tx, stock_id, institution_id).await?;
        let price = current_price(&mut tx, &stock).await?;

        if let Some(max) = stock.per_user_short_limit {
            let open = ShortRepository::open_quantity(&mut tx, portfolio.id, stock_id).await?;
            if open + quantity > max {
                return Err(TradeError::LimitExceeded {
                    limit: "per-user short",
                    attempted: open + quantity,
                    max,
                });
            }
        }

        let expires_at = Utc::now() + Duration::seconds(duration_seconds);
        let short = ShortRepository::insert_open(
            &mut tx,
            portfolio.id,
            stock_id,
            quantity,
            price,
            duration_seconds,
            expires_at,
        )
        .await?;
        TradeRepository::insert(
            &mut tx,
            portfolio.id,
            stock_id,
            TradeKind::ShortOpen,
            quantity,
            price,
        )
        .await?;
        tx.commit().await?;

        info!(user_id, stock_id, quantity, %price, "short opened");
        Ok(ShortOpenReceipt {
            short_id: short.id,
            stock_id,
            quantity,
            open_price: price,
            expires_at: short.expires_at,
        })
    }

    /// Closes `quantity` shorted shares at the current price, consuming open
    /// contracts soonest-expiry-first. All-or-nothing: a shortfall rejects
    /// the whole request before any row changes.
    ///
    /// # Errors
    /// `InvalidInput`, `InstrumentNotFound`, or `InsufficientShorts`; all
    /// leave the database untouched.
    pub async fn close_short(
        &self,
        user_id: i64,
        institution_id: i64,
        stock_id: i64,
        quantity: i64,
    ) -> TradeResult<ShortCloseReceipt> {
        ensure_positive(quantity, "quantity")?;
        debug!(user_id, stock_id, quantity, "short close requested");

        let mut tx = self.pool.begin().await?;
        let portfolio =
            PortfolioRepository::lock_or_create(&mut tx, user_id, self.config.seed_cash).await?;
        let stock = active_instrument(&mut tx, stock_id, institution_id).await?;
        let price = current_price(&mut tx, &stock).await?;

        let lots: Vec<ShortLot> = ShortRepository::lock_open(&mut tx, portfolio.id, stock_id)
            .await?
            .into_iter()
            .map(|row| ShortLot {
                id: row.id,
                quantity: row.quantity,
                open_price: row.open_price,
                expires_at: row.expires_at,
            })
            .collect();
        let plan = plan_close(&lots, quantity, price)?;

        let closed_at = Utc::now();
        for allocation in &plan.allocations {
            if allocation.remaining == 0 {
                ShortRepository::mark_closed(&mut tx, allocation.short_id, price, closed_at)
                    .await?;
            } else {
                ShortRepository::reduce_quantity(&mut tx, allocation.short_id, allocation.remaining)
                    .await?;
            }
        }

        PortfolioRepository::apply_settlement(
            &mut tx,
            portfolio.id,
            plan.realized_pl,
            plan.realized_pl,
        )
        .await?;
        TradeRepository::insert(
            &mut tx,
            portfolio.id,
            stock_id,
            TradeKind::ShortClose,
            quantity,
            price,
        )
        .await?;
        tx.commit().await?;

        info!(user_id, stock_id, quantity, %price, realized_pl = %plan.realized_pl, "short closed");
        Ok(ShortCloseReceipt {
            stock_id,
            quantity,
            close_price: price,
            realized_pl: plan.realized_pl,
        })
    }

    /// Force-closes every expired open contract in an institution at the
    /// current price. Invoked by an external scheduler, never by user trade
    /// requests.
    ///
    /// Expired rows are taken under `FOR UPDATE`, so a racing user close on
    /// the same contract either sees it already closed or blocks until this
    /// transaction resolves.
    ///
    /// # Errors
    /// Returns `Storage`/`Internal` on database failure; the transaction is
    /// rolled back and no contract is half-closed.
    pub async fn sweep_expired_shorts(&self, institution_id: i64) -> TradeResult<Vec<SweptShort>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let expired = ShortRepository::lock_expired(&mut tx, institution_id, now).await?;

        let mut swept = Vec::with_capacity(expired.len());
        for row in expired {
            let price = PriceRepository::current_price_tx(&mut tx, row.stock_id)
                .await?
                .unwrap_or(row.initial_price);
            let realized_pl = short_pl(row.open_price, price, row.quantity);

            PortfolioRepository::apply_settlement(&mut tx, row.portfolio_id, realized_pl, realized_pl)
                .await?;
            ShortRepository::mark_closed(&mut tx, row.id, price, now).await?;
            TradeRepository::insert(
                &mut tx,
                row.portfolio_id,
                row.stock_id,
                TradeKind::ShortClose,
                row.quantity,
                price,
            )
            .await?;

            swept.push(SweptShort {
                short_id: row.id,
                portfolio_id: row.portfolio_id,
                stock_id: row.stock_id,
                quantity: row.quantity,
                close_price: price,
                realized_pl,
            });
        }
        tx.commit().await?;

        if !swept.is_empty() {
            info!(institution_id, count = swept.len(), "expired shorts swept");
        }
        Ok(swept)
    }

    /// Records a manager-set price point for an active instrument.
    ///
    /// # Errors
    /// `InvalidInput` when the price is not positive; `InstrumentNotFound`
    /// when the instrument is missing, inactive, or cross-institution.
    pub async fn record_price(
        &self,
        stock_id: i64,
        institution_id: i64,
        price: Decimal,
    ) -> TradeResult<PricePointRecord> {
        if price <= Decimal::ZERO {
            return Err(TradeError::invalid_input("price must be positive"));
        }

        let mut tx = self.pool.begin().await?;
        active_instrument(&mut tx, stock_id, institution_id).await?;
        let point = PriceRepository::record(&mut tx, stock_id, price).await?;
        InstrumentRepository::touch(&mut tx, stock_id).await?;
        tx.commit().await?;

        info!(stock_id, %price, "price recorded");
        Ok(point)
    }
}

/// Rejects non-positive quantities and durations before a transaction is
/// even opened.
fn ensure_positive(value: i64, what: &str) -> TradeResult<()> {
    if value <= 0 {
        return Err(TradeError::invalid_input(format!("{what} must be positive")));
    }
    Ok(())
}

/// Resolves an instrument that must accept trades: present in the caller's
/// institution and active.
async fn active_instrument(
    conn: &mut PgConnection,
    stock_id: i64,
    institution_id: i64,
) -> TradeResult<InstrumentRecord> {
    match InstrumentRepository::get_tx(conn, stock_id, institution_id).await? {
        Some(stock) if stock.active => Ok(stock),
        _ => Err(TradeError::InstrumentNotFound { stock_id }),
    }
}

/// Current price as of lock acquisition: the latest point, or the seed price
/// when the series is empty.
async fn current_price(conn: &mut PgConnection, stock: &InstrumentRecord) -> TradeResult<Decimal> {
    let latest = PriceRepository::current_price_tx(conn, stock.id).await?;
    Ok(latest.unwrap_or(stock.initial_price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive_accepts_positive() {
        assert!(ensure_positive(1, "quantity").is_ok());
        assert!(ensure_positive(i64::MAX, "quantity").is_ok());
    }

    #[test]
    fn test_ensure_positive_rejects_zero_and_negative() {
        for bad in [0, -1, i64::MIN] {
            let err = ensure_positive(bad, "duration").unwrap_err();
            assert!(matches!(err, TradeError::InvalidInput(_)));
            assert!(err.to_string().contains("duration"));
        }
    }
}
