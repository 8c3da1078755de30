//! Subcommand handlers. Successful results print as JSON; rejected trades
//! surface the engine's stable error code and exit non-zero.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use stocksim_core::TradeResult;
use stocksim_engine::TradeEngine;

fn report<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn finish<T: Serialize>(result: TradeResult<T>) -> Result<()> {
    match result {
        Ok(value) => report(&value),
        Err(err) if err.is_recoverable() => bail!("rejected ({}): {err}", err.code()),
        Err(err) => {
            tracing::error!(%err, "operation failed");
            Err(err.into())
        }
    }
}

pub async fn board(engine: &TradeEngine, institution: i64) -> Result<()> {
    finish(engine.quote_board(institution).await)
}

pub async fn history(engine: &TradeEngine, institution: i64, stock: i64, limit: i64) -> Result<()> {
    finish(engine.price_history(stock, institution, limit).await)
}

pub async fn change(engine: &TradeEngine, institution: i64, stock: i64) -> Result<()> {
    finish(engine.change_since(stock, institution).await)
}

pub async fn record_price(
    engine: &TradeEngine,
    institution: i64,
    stock: i64,
    price: Decimal,
) -> Result<()> {
    finish(engine.record_price(stock, institution, price).await)
}

pub async fn buy(
    engine: &TradeEngine,
    user: i64,
    institution: i64,
    stock: i64,
    quantity: i64,
) -> Result<()> {
    finish(engine.buy(user, institution, stock, quantity).await)
}

pub async fn sell(
    engine: &TradeEngine,
    user: i64,
    institution: i64,
    stock: i64,
    quantity: i64,
) -> Result<()> {
    finish(engine.sell(user, institution, stock, quantity).await)
}

pub async fn short_open(
    engine: &TradeEngine,
    user: i64,
    institution: i64,
    stock: i64,
    quantity: i64,
    duration: i64,
) -> Result<()> {
    finish(
        engine
            .open_short(user, institution, stock, quantity, duration)
            .await,
    )
}

pub async fn short_close(
    engine: &TradeEngine,
    user: i64,
    institution: i64,
    stock: i64,
    quantity: i64,
) -> Result<()> {
    finish(engine.close_short(user, institution, stock, quantity).await)
}

pub async fn sweep(engine: &TradeEngine, institution: i64) -> Result<()> {
    finish(engine.sweep_expired_shorts(institution).await)
}

pub async fn portfolio(engine: &TradeEngine, user: i64, institution: i64) -> Result<()> {
    finish(engine.portfolio_snapshot(user, institution).await)
}

pub async fn activity(engine: &TradeEngine, user: i64, limit: i64) -> Result<()> {
    finish(engine.activity(user, limit).await)
}

pub async fn durations(engine: &TradeEngine, institution: i64) -> Result<()> {
    finish(engine.short_durations(institution).await)
}
