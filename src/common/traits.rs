//! Shared traits and interfaces
//!
//! Seams between the engine and its environment: where time and server
//! seeds come from, and where settled games are kept for later verification.

use crate::common::types::PlayerId;
use crate::games::fairness::ServerSeed;
use crate::games::settlement::SettlementRecord;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};

/// Time source for withdrawal windows and record timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Where new server seeds come from when a commitment is drawn
pub trait SeedSource: Send + Sync {
    fn server_seed(&self) -> ServerSeed;
}

/// Operating system RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn server_seed(&self) -> ServerSeed {
        ServerSeed::generate()
    }
}

/// Hands out a fixed list of seeds in order, then repeats the last one.
///
/// Boards stay distinct across games because every game has its own nonce.
/// Only for tests and replays: anyone holding the list knows every board.
#[derive(Debug)]
pub struct FixedSeedSource {
    seeds: Vec<ServerSeed>,
    next: Mutex<usize>,
}

impl FixedSeedSource {
    pub fn new(seed: ServerSeed) -> Self {
        Self::sequence(vec![seed])
    }

    /// An empty list falls back to the OS RNG
    pub fn sequence(seeds: Vec<ServerSeed>) -> Self {
        Self {
            seeds,
            next: Mutex::new(0),
        }
    }
}

impl SeedSource for FixedSeedSource {
    fn server_seed(&self) -> ServerSeed {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let seed = self.seeds.get(*next).or_else(|| self.seeds.last()).cloned();
        *next = next.saturating_add(1);
        seed.unwrap_or_else(ServerSeed::generate)
    }
}

/// Destination for settled games (audit and verification history)
pub trait GameArchive: Send + Sync {
    /// Store a settled game; called exactly once per game
    fn archive(&self, record: SettlementRecord);

    /// All settled games of a player, oldest first
    fn history(&self, player: &PlayerId) -> Vec<SettlementRecord>;

    /// Look up a settled game by its id
    fn find(&self, game_id: &str) -> Option<SettlementRecord>;

    /// Number of settled games across all players
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
