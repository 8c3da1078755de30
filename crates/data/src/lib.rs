//! PostgreSQL storage layer for the classroom trading simulator.
//!
//! This crate provides:
//! - Database client and idempotent schema bootstrap
//! - Data models for instruments, prices, portfolios, positions, shorts, trades
//! - Repositories for typed table access, including the transaction-scoped
//!   locking queries the trade engine composes

pub mod database;
pub mod models;
pub mod repositories;

pub use database::DatabaseClient;

// Re-export models
pub use models::{
    ActivityRow, InstrumentRecord, PortfolioRecord, PositionHolding, PositionRecord,
    PricePointRecord, QuoteBoardRow, ShortDurationOption, ShortHolding, ShortPositionRecord,
    TradeKind, TradeRecord,
};

// Re-export repositories
pub use repositories::{
    DurationRepository, InstrumentRepository, PortfolioRepository, PositionRepository,
    PriceRepository, Repositories, ShortRepository, TradeRepository,
};
