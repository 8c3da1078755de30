//! Core types, configuration, and error taxonomy for the classroom trading
//! simulator.
//!
//! This crate provides:
//! - The `TradeError` taxonomy shared by the engine and its callers
//! - Application configuration structs and the figment-based loader

pub mod config;
pub mod config_loader;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, SimulationConfig};
pub use config_loader::ConfigLoader;
pub use error::{TradeError, TradeResult};
