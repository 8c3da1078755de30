//! Trade execution and portfolio accounting engine.
//!
//! This crate provides:
//! - Pure accounting functions (weighted averages, valuations, short P&L)
//! - The short-close allocation planner
//! - `TradeEngine`, the transactional orchestrator over the storage layer
//! - The portfolio snapshot builder

pub mod accounting;
pub mod close_plan;
pub mod executor;
pub mod market;
pub mod snapshot;

pub use accounting::{position_valuation, short_pl, weighted_average};
pub use close_plan::{plan_close, CloseAllocation, ClosePlan, ShortLot};
pub use executor::{ShortCloseReceipt, ShortOpenReceipt, SweptShort, TradeEngine, TradeReceipt};
pub use market::{PriceChange, QuoteView};
pub use snapshot::{PortfolioSnapshot, PositionView, ShortView, SnapshotTotals};
