use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Tunables for the simulator itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Cash balance a portfolio is seeded with on first access.
    pub seed_cash: Decimal,
    /// Upper bound on price-history reads.
    pub history_max: i64,
    /// Upper bound on activity-feed reads.
    pub activity_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/stocksim".to_string(),
                max_connections: 10,
            },
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed_cash: Decimal::new(100_000, 0),
            history_max: 365,
            activity_limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_seed_cash() {
        let config = SimulationConfig::default();
        assert_eq!(config.seed_cash, dec!(100000));
    }

    #[test]
    fn test_default_bounds() {
        let config = SimulationConfig::default();
        assert_eq!(config.history_max, 365);
        assert_eq!(config.activity_limit, 100);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).expect("serialization failed");
        let deserialized: AppConfig = serde_json::from_str(&json).expect("deserialization failed");

        assert_eq!(deserialized.database.max_connections, 10);
        assert_eq!(deserialized.simulation.seed_cash, config.simulation.seed_cash);
    }
}
