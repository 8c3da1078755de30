//! Database repositories for the trading simulator.
//!
//! Pool-scoped methods serve read views; the associated functions taking a
//! `PgConnection` are composed by the engine inside a single transaction so
//! row locks span the whole trade unit.

pub mod duration_repo;
pub mod instrument_repo;
pub mod portfolio_repo;
pub mod position_repo;
pub mod price_repo;
pub mod short_repo;
pub mod trade_repo;

pub use duration_repo::DurationRepository;
pub use instrument_repo::InstrumentRepository;
pub use portfolio_repo::PortfolioRepository;
pub use position_repo::PositionRepository;
pub use price_repo::PriceRepository;
pub use short_repo::{ExpiredShort, ShortRepository};
pub use trade_repo::TradeRepository;

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
pub struct Repositories {
    pub instruments: InstrumentRepository,
    pub prices: PriceRepository,
    pub portfolios: PortfolioRepository,
    pub positions: PositionRepository,
    pub shorts: ShortRepository,
    pub trades: TradeRepository,
    pub durations: DurationRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            instruments: InstrumentRepository::new(pool.clone()),
            prices: PriceRepository::new(pool.clone()),
            portfolios: PortfolioRepository::new(pool.clone()),
            positions: PositionRepository::new(pool.clone()),
            shorts: ShortRepository::new(pool.clone()),
            trades: TradeRepository::new(pool.clone()),
            durations: DurationRepository::new(pool),
        }
    }
}
