//! Read-side market views: price history, change-since-last, the quote
//! board, the activity feed, and the short-duration menu.

use rust_decimal::Decimal;
use serde::Serialize;

use stocksim_core::{TradeError, TradeResult};
use stocksim_data::models::{
    ActivityRow, InstrumentRecord, PricePointRecord, QuoteBoardRow, ShortDurationOption,
};

use crate::executor::TradeEngine;

/// Current price and movement since the previous point.
#[derive(Debug, Clone, Serialize)]
pub struct PriceChange {
    pub stock_id: i64,
    pub current: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
}

/// One quote-board entry.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    pub stock_id: i64,
    pub ticker: String,
    pub name: String,
    pub current_price: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
}

impl From<QuoteBoardRow> for QuoteView {
    fn from(row: QuoteBoardRow) -> Self {
        Self {
            stock_id: row.stock_id,
            current_price: row.current(),
            change: row.change(),
            change_pct: row.change_pct(),
            ticker: row.ticker,
            name: row.name,
        }
    }
}

impl TradeEngine {
    /// Most-recent-first price history; `limit` is clamped to the configured
    /// maximum.
    ///
    /// # Errors
    /// `InstrumentNotFound` when the instrument is missing, inactive, or
    /// cross-institution.
    pub async fn price_history(
        &self,
        stock_id: i64,
        institution_id: i64,
        limit: i64,
    ) -> TradeResult<Vec<PricePointRecord>> {
        self.require_active(stock_id, institution_id).await?;
        let limit = limit.clamp(1, self.config().history_max);
        Ok(self.repos().prices.history(stock_id, limit).await?)
    }

    /// Current price plus absolute and percentage change since one step back
    /// (or since the seed price when fewer than two points exist).
    ///
    /// # Errors
    /// `InstrumentNotFound` when the instrument is missing, inactive, or
    /// cross-institution.
    pub async fn change_since(
        &self,
        stock_id: i64,
        institution_id: i64,
    ) -> TradeResult<PriceChange> {
        let stock = self.require_active(stock_id, institution_id).await?;
        let latest = self.repos().prices.latest_two(stock_id).await?;

        let row = QuoteBoardRow {
            stock_id,
            ticker: stock.ticker,
            name: stock.name,
            initial_price: stock.initial_price,
            current_price: latest.first().copied(),
            previous_price: latest.get(1).copied(),
        };

        Ok(PriceChange {
            stock_id,
            current: row.current(),
            change: row.change(),
            change_pct: row.change_pct(),
        })
    }

    /// The institution's quote board: every active instrument with its
    /// current price and movement, ordered by ticker.
    ///
    /// # Errors
    /// Returns `Storage`/`Internal` on database failure.
    pub async fn quote_board(&self, institution_id: i64) -> TradeResult<Vec<QuoteView>> {
        let stocks = self.repos().instruments.list_active(institution_id).await?;
        let ids: Vec<i64> = stocks.iter().map(|s| s.id).collect();
        let pairs = self.repos().prices.latest_pairs(&ids).await?;

        Ok(stocks
            .into_iter()
            .map(|stock| {
                let (current, previous) = pairs
                    .get(&stock.id)
                    .map_or((None, None), |&(current, previous)| {
                        (Some(current), previous)
                    });
                QuoteView::from(QuoteBoardRow {
                    stock_id: stock.id,
                    ticker: stock.ticker,
                    name: stock.name,
                    initial_price: stock.initial_price,
                    current_price: current,
                    previous_price: previous,
                })
            })
            .collect())
    }

    /// A user's recent trades, newest first; `limit` is clamped to the
    /// configured maximum.
    ///
    /// # Errors
    /// Returns `Storage`/`Internal` on database failure.
    pub async fn activity(&self, user_id: i64, limit: i64) -> TradeResult<Vec<ActivityRow>> {
        let limit = limit.clamp(1, self.config().activity_limit);
        Ok(self.repos().trades.recent_for_user(user_id, limit).await?)
    }

    /// The institution's short-duration menu (or the built-in defaults).
    ///
    /// # Errors
    /// Returns `Storage`/`Internal` on database failure.
    pub async fn short_durations(
        &self,
        institution_id: i64,
    ) -> TradeResult<Vec<ShortDurationOption>> {
        Ok(self.repos().durations.options(institution_id).await?)
    }

    async fn require_active(
        &self,
        stock_id: i64,
        institution_id: i64,
    ) -> TradeResult<InstrumentRecord> {
        match self.repos().instruments.get(stock_id, institution_id).await? {
            Some(stock) if stock.active => Ok(stock),
            _ => Err(TradeError::InstrumentNotFound { stock_id }),
        }
    }
}
