//! Mines - Provably Fair Wagering Engine
//!
//! Core of a "Mines" game: a stake is escrowed, a square board is seeded
//! with hidden mines through a commit-reveal seed pair, every safe reveal
//! raises the payout multiplier, and the game settles on a mine hit, a
//! perfect board or a cashout.
//!
//! ```no_run
//! use mines_engine::{Amount, EngineConfig, MinesEngine, PlayerId, StartGameRequest};
//!
//! # fn main() -> Result<(), mines_engine::MinesError> {
//! let engine = MinesEngine::new(EngineConfig::default())?;
//! let player = PlayerId::from("alice");
//! engine.deposit(&player, Amount::tokens(5))?;
//!
//! let commitment = engine.commitment(&player);
//! println!("server seed hash {}", commitment.server_seed_hash);
//!
//! engine.start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), "my seed"))?;
//! let outcome = engine.reveal_tile(&player, 12)?;
//! if !outcome.is_mine {
//!     let record = engine.cashout(&player)?;
//!     println!("won {}", record.amount_won);
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod simulation;
pub mod storage;

pub use common::config::{ConfigBuilder, ConfigLoader};
pub use common::traits::{Clock, FixedSeedSource, GameArchive, ManualClock, OsSeedSource, SeedSource, SystemClock};
pub use common::types::{Amount, Multiplier, PlayerId};
pub use config::EngineConfig;
pub use engine::MinesEngine;
pub use errors::{ErrorKind, GameError, LedgerError, MinesError, MinesResult};
pub use events::{EngineEvent, GameEvent};
pub use games::{
    Difficulty, GameParams, GameSnapshot, GameStarted, GameState, RevealOutcome, SeedCommitment,
    SettlementRecord, StartGameRequest,
};
pub use ledger::{BalanceView, HouseBankroll};
pub use storage::MemoryArchive;
