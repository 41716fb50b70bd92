//! Configuration management with validation and defaults
//!
//! Centralized engine configuration. Every section has defaults matching
//! the production game, and `validate()` rejects inconsistent combinations
//! before an engine is built.

use crate::common::types::Amount;
use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Board, multiplier and stake rules
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fraction of the fair multiplier paid out (0.97 = 3% edge)
    pub house_edge: f64,
    /// Smallest supported grid side (tiles = side * side)
    pub min_grid_size: u32,
    /// Largest supported grid side
    pub max_grid_size: u32,
    /// Decimal digits kept when the reported multiplier is truncated
    pub payout_precision: u8,
    pub min_stake: Amount,
    /// Optional cap on a single settlement payout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payout: Option<Amount>,
    pub max_client_seed_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            house_edge: 0.97,
            min_grid_size: 2,
            max_grid_size: 10,
            payout_precision: 4,
            min_stake: Amount::from_base_units(Amount::UNIT / 10), // 0.1 token
            max_payout: None,
            max_client_seed_len: 64,
        }
    }
}

impl GameConfig {
    /// House edge as parts per million, the form used in payout arithmetic
    pub fn house_edge_ppm(&self) -> u64 {
        (self.house_edge * 1_000_000.0).round() as u64
    }

    pub fn min_tiles(&self) -> u32 {
        self.min_grid_size * self.min_grid_size
    }

    pub fn max_tiles(&self) -> u32 {
        self.max_grid_size * self.max_grid_size
    }
}

/// Withdrawal limits and house funding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub per_transaction_withdraw_limit: Amount,
    pub daily_withdraw_limit: Amount,
    /// Length of the rolling withdrawal window in seconds
    pub withdraw_window_secs: u64,
    pub house_initial_balance: Amount,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            per_transaction_withdraw_limit: Amount::tokens(10),
            daily_withdraw_limit: Amount::tokens(200),
            withdraw_window_secs: 86_400,
            house_initial_balance: Amount::tokens(1_000),
        }
    }
}

/// Notification outbox sizing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Monitoring and logging configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: LogLevel::Info,
        }
    }
}

/// Configuration validation and factory methods
impl EngineConfig {
    /// Configuration for deterministic tests: full precision, tiny stakes allowed
    pub fn testing() -> Self {
        Self {
            game: GameConfig {
                payout_precision: 8,
                min_stake: Amount::from_base_units(1),
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let game = &self.game;
        if !(game.house_edge > 0.0 && game.house_edge <= 1.0) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "house_edge must be in (0, 1], got {}",
                game.house_edge
            )));
        }

        if game.min_grid_size < 2 {
            return Err(ConfigValidationError::InvalidValue(
                "min_grid_size must be >= 2".to_string(),
            ));
        }

        // 10x10 is the largest board whose perfect-game multiplier fits the fixed-point range
        if game.max_grid_size > 10 {
            return Err(ConfigValidationError::InvalidValue(
                "max_grid_size must be <= 10".to_string(),
            ));
        }

        if game.min_grid_size > game.max_grid_size {
            return Err(ConfigValidationError::LogicalInconsistency(format!(
                "min_grid_size {} exceeds max_grid_size {}",
                game.min_grid_size, game.max_grid_size
            )));
        }

        if game.payout_precision > 8 {
            return Err(ConfigValidationError::InvalidValue(
                "payout_precision must be <= 8".to_string(),
            ));
        }

        if game.min_stake.is_zero() {
            return Err(ConfigValidationError::InvalidValue(
                "min_stake must be > 0".to_string(),
            ));
        }

        if game.max_client_seed_len == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "max_client_seed_len must be > 0".to_string(),
            ));
        }

        if let Some(cap) = game.max_payout {
            if cap < game.min_stake {
                return Err(ConfigValidationError::LogicalInconsistency(
                    "max_payout is below min_stake".to_string(),
                ));
            }
        }

        let ledger = &self.ledger;
        if ledger.per_transaction_withdraw_limit.is_zero() || ledger.daily_withdraw_limit.is_zero() {
            return Err(ConfigValidationError::InvalidValue(
                "withdrawal limits must be > 0".to_string(),
            ));
        }

        if ledger.per_transaction_withdraw_limit > ledger.daily_withdraw_limit {
            return Err(ConfigValidationError::LogicalInconsistency(
                "per_transaction_withdraw_limit exceeds daily_withdraw_limit".to_string(),
            ));
        }

        if ledger.withdraw_window_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "withdraw_window_secs must be > 0".to_string(),
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "channel_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue(String),
    LogicalInconsistency(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigValidationError::LogicalInconsistency(msg) => write!(f, "Configuration logical inconsistency: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}
