//! Error types for the Mines wagering engine
//!
//! Every rejected request carries its kind plus the offending value so a
//! presentation layer can render an actionable message. Validation errors
//! are always returned before any state is touched.

use crate::common::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root error type for all engine operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinesError {
    /// Configuration related errors
    Configuration(ConfigurationError),

    /// Game request rejected by the state machine
    Game(GameError),

    /// Ledger request rejected by the balance rules
    Ledger(LedgerError),
}

/// Stable, serializable classification of request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidSeed,
    GameAlreadyActive,
    GameNotActive,
    InvalidBoardParameters,
    TileOutOfRange,
    TileAlreadyRevealed,
    NothingRevealed,
    InvalidAmount,
    InsufficientBalance,
    WithdrawalLimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidSeed => "INVALID_SEED",
            ErrorKind::GameAlreadyActive => "GAME_ALREADY_ACTIVE",
            ErrorKind::GameNotActive => "GAME_NOT_ACTIVE",
            ErrorKind::InvalidBoardParameters => "INVALID_BOARD_PARAMETERS",
            ErrorKind::TileOutOfRange => "TILE_OUT_OF_RANGE",
            ErrorKind::TileAlreadyRevealed => "TILE_ALREADY_REVEALED",
            ErrorKind::NothingRevealed => "NOTHING_REVEALED",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::WithdrawalLimitExceeded => "WITHDRAWAL_LIMIT_EXCEEDED",
        };
        f.write_str(name)
    }
}

/// Game request errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid client seed ({length} bytes): {reason}")]
    InvalidSeed { length: usize, reason: String },

    #[error("Player already has an active game {game_id}")]
    GameAlreadyActive { game_id: String },

    #[error("No active game")]
    GameNotActive,

    #[error("Invalid board: {tile_count} tiles with {mine_count} mines ({reason})")]
    InvalidBoardParameters {
        tile_count: u32,
        mine_count: u32,
        reason: String,
    },

    #[error("Tile {index} is outside the board of {tile_count} tiles")]
    TileOutOfRange { index: u32, tile_count: u32 },

    #[error("Tile {index} was already revealed")]
    TileAlreadyRevealed { index: u32 },

    #[error("Reveal at least one tile before cashing out")]
    NothingRevealed,

    #[error("Stake {stake} is below the minimum stake {min_stake}")]
    StakeTooSmall { stake: Amount, min_stake: Amount },
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidSeed { .. } => ErrorKind::InvalidSeed,
            GameError::GameAlreadyActive { .. } => ErrorKind::GameAlreadyActive,
            GameError::GameNotActive => ErrorKind::GameNotActive,
            GameError::InvalidBoardParameters { .. } => ErrorKind::InvalidBoardParameters,
            GameError::TileOutOfRange { .. } => ErrorKind::TileOutOfRange,
            GameError::TileAlreadyRevealed { .. } => ErrorKind::TileAlreadyRevealed,
            GameError::NothingRevealed => ErrorKind::NothingRevealed,
            GameError::StakeTooSmall { .. } => ErrorKind::InvalidAmount,
        }
    }
}

/// Which withdrawal cap a request ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalLimit {
    PerTransaction,
    Daily,
}

impl fmt::Display for WithdrawalLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalLimit::PerTransaction => write!(f, "per-transaction"),
            WithdrawalLimit::Daily => write!(f, "daily"),
        }
    }
}

/// Balance ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Amount },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Withdrawal of {requested} exceeds the {limit} limit of {cap} ({already_withdrawn} already withdrawn in window)")]
    WithdrawalLimitExceeded {
        requested: Amount,
        limit: WithdrawalLimit,
        cap: Amount,
        already_withdrawn: Amount,
    },

    #[error("Balance overflow while crediting {amount}")]
    BalanceOverflow { amount: Amount },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::WithdrawalLimitExceeded { .. } => ErrorKind::WithdrawalLimitExceeded,
            LedgerError::BalanceOverflow { .. } => ErrorKind::InvalidAmount,
        }
    }
}

/// Configuration and validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    ValidationFailed(String),
    InvalidValue { field: String, value: String, reason: String },
    LoadFailed(String),
    SaveFailed(String),
}

impl fmt::Display for MinesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinesError::Configuration(e) => write!(f, "Configuration error: {}", e),
            MinesError::Game(e) => write!(f, "Game error: {}", e),
            MinesError::Ledger(e) => write!(f, "Ledger error: {}", e),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ConfigurationError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: '{}' ({})", field, value, reason)
            }
            ConfigurationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigurationError::SaveFailed(msg) => write!(f, "Failed to save configuration: {}", msg),
        }
    }
}

impl std::error::Error for MinesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MinesError::Configuration(e) => Some(e),
            MinesError::Game(e) => Some(e),
            MinesError::Ledger(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigurationError {}

impl From<ConfigurationError> for MinesError {
    fn from(e: ConfigurationError) -> Self {
        MinesError::Configuration(e)
    }
}

impl From<GameError> for MinesError {
    fn from(e: GameError) -> Self {
        MinesError::Game(e)
    }
}

impl From<LedgerError> for MinesError {
    fn from(e: LedgerError) -> Self {
        MinesError::Ledger(e)
    }
}

impl MinesError {
    /// Request failure kind; `None` for configuration problems
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            MinesError::Configuration(_) => None,
            MinesError::Game(e) => Some(e.kind()),
            MinesError::Ledger(e) => Some(e.kind()),
        }
    }
}

pub type MinesResult<T> = Result<T, MinesError>;
