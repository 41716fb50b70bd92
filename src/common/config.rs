//! Configuration loading for the Mines engine
//!
//! Reads an optional TOML file, applies `MINES_*` environment overrides
//! and validates the result.

use crate::common::types::Amount;
use crate::config::{EngineConfig, EventsConfig, GameConfig, LedgerConfig, LogLevel, MonitoringConfig};
use crate::errors::{ConfigurationError, MinesResult};
use std::env;
use std::path::Path;

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> MinesResult<EngineConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            EngineConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> MinesResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut EngineConfig) -> MinesResult<()> {
        if let Ok(edge) = env::var("MINES_HOUSE_EDGE") {
            config.game.house_edge = edge.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "MINES_HOUSE_EDGE".to_string(),
                value: edge,
                reason: "Invalid decimal fraction".to_string(),
            })?;
        }

        if let Ok(precision) = env::var("MINES_PAYOUT_PRECISION") {
            config.game.payout_precision = precision.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "MINES_PAYOUT_PRECISION".to_string(),
                value: precision,
                reason: "Invalid digit count".to_string(),
            })?;
        }

        if let Ok(limit) = env::var("MINES_PER_TX_WITHDRAW_LIMIT") {
            config.ledger.per_transaction_withdraw_limit = parse_token_env("MINES_PER_TX_WITHDRAW_LIMIT", limit)?;
        }

        if let Ok(limit) = env::var("MINES_DAILY_WITHDRAW_LIMIT") {
            config.ledger.daily_withdraw_limit = parse_token_env("MINES_DAILY_WITHDRAW_LIMIT", limit)?;
        }

        if let Ok(level) = env::var("MINES_LOG_LEVEL") {
            config.monitoring.log_level = level.parse().map_err(|reason| ConfigurationError::InvalidValue {
                field: "MINES_LOG_LEVEL".to_string(),
                value: level,
                reason,
            })?;
        }

        Ok(())
    }

    fn validate(&self, config: &EngineConfig) -> MinesResult<()> {
        config
            .validate()
            .map_err(|e| ConfigurationError::ValidationFailed(e.to_string()).into())
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig, path: &str) -> MinesResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

/// Withdrawal limits are given in whole-token decimal notation (e.g. "10" or "2.5")
fn parse_token_env(field: &str, value: String) -> Result<Amount, ConfigurationError> {
    Amount::parse_tokens(&value).ok_or_else(|| ConfigurationError::InvalidValue {
        field: field.to_string(),
        value,
        reason: "Invalid token amount".to_string(),
    })
}

/// Builder pattern for creating configurations
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn game(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    pub fn ledger(mut self, ledger: LedgerConfig) -> Self {
        self.config.ledger = ledger;
        self
    }

    pub fn events(mut self, events: EventsConfig) -> Self {
        self.config.events = events;
        self
    }

    pub fn monitoring(mut self, monitoring: MonitoringConfig) -> Self {
        self.config.monitoring = monitoring;
        self
    }

    pub fn house_edge(mut self, house_edge: f64) -> Self {
        self.config.game.house_edge = house_edge;
        self
    }

    pub fn payout_precision(mut self, digits: u8) -> Self {
        self.config.game.payout_precision = digits;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.monitoring.log_level = level;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> MinesResult<()> {
    let config = EngineConfig::default();
    ConfigLoader::new().save(&config, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_validation() {
        let loader = ConfigLoader::new();
        let mut config = EngineConfig::default();

        assert!(loader.validate(&config).is_ok());

        config.game.payout_precision = 9;
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .house_edge(0.99)
            .payout_precision(2)
            .log_level(LogLevel::Warn)
            .build();

        assert_eq!(config.game.house_edge, 0.99);
        assert_eq!(config.game.payout_precision, 2);
        assert_eq!(config.monitoring.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_save_and_load_config() -> MinesResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original_config = ConfigBuilder::new().house_edge(0.95).build();
        ConfigLoader::new().save(&original_config, path)?;

        let loaded_config = ConfigLoader::new().with_path(path).load()?;

        assert_eq!(loaded_config.game.house_edge, 0.95);
        assert_eq!(
            loaded_config.ledger.daily_withdraw_limit,
            original_config.ledger.daily_withdraw_limit
        );

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[events]\nchannel_capacity = 8\n").unwrap();

        let config = ConfigLoader::new().with_path(temp_file.path()).load().unwrap();

        assert_eq!(config.events.channel_capacity, 8);
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_missing_file_fails() {
        let result = ConfigLoader::new().with_path("/nonexistent/mines.toml").load();
        assert!(matches!(
            result,
            Err(crate::errors::MinesError::Configuration(ConfigurationError::LoadFailed(_)))
        ));
    }

    #[test]
    fn test_parse_token_env() {
        assert_eq!(parse_token_env("X", "2.5".to_string()), Ok(Amount::from_base_units(250_000_000)));
        assert!(parse_token_env("X", "ten".to_string()).is_err());
    }
}
