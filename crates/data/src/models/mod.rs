//! Data models for the trading simulator tables.

pub mod instrument;
pub mod portfolio;
pub mod position;
pub mod price_point;
pub mod short_position;
pub mod trade;

pub use instrument::{InstrumentRecord, QuoteBoardRow};
pub use portfolio::PortfolioRecord;
pub use position::{PositionHolding, PositionRecord};
pub use price_point::PricePointRecord;
pub use short_position::{ShortDurationOption, ShortHolding, ShortPositionRecord};
pub use trade::{ActivityRow, TradeKind, TradeRecord};
