use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, and
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads application configuration from a specific TOML file.
    ///
    /// Environment variables prefixed with `STOCKSIM_` override file values
    /// (`STOCKSIM_DATABASE__URL`, `STOCKSIM_SIMULATION__SEED_CASH`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("STOCKSIM_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_from("config/does_not_exist.toml")
            .expect("defaults should apply when the file is absent");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.simulation.history_max, 365);
    }
}
