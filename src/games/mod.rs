pub mod board;
pub mod fairness;
pub mod multiplier;
pub mod settlement;
pub mod state_machine;
pub mod types;

pub use board::Board;
pub use fairness::{PendingCommitment, SeedCommitment, SeedPair, ServerSeed};
pub use multiplier::{MultiplierCalculator, MultiplierStep};
pub use settlement::SettlementRecord;
pub use state_machine::RevealStep;
pub use types::*;
