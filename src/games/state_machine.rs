//! Reveal and cashout transitions on a single game.
//!
//! Every legality check runs before anything is mutated, so a rejected
//! request leaves the game exactly as it was. A mine hit ends the game
//! before any multiplier work happens for that index.

use crate::common::types::{Amount, Multiplier, PlayerId};
use crate::errors::GameError;
use crate::games::board::Board;
use crate::games::fairness::SeedPair;
use crate::games::multiplier::MultiplierCalculator;
use crate::games::types::{Game, GameParams, GameState};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of one accepted reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    pub index: u32,
    pub is_mine: bool,
    pub state: GameState,
    pub multiplier: Multiplier,
}

impl Game {
    /// Create an active game; the board is fixed here and never recomputed
    pub fn new(
        player: PlayerId,
        params: GameParams,
        stake: Amount,
        seeds: SeedPair,
        started_at: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        let board = Board::generate(&seeds.digest(), params.tile_count, params.mine_count)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            player,
            params,
            stake,
            seeds,
            board,
            revealed: Vec::new(),
            exploded_at: None,
            current_multiplier: Multiplier::ONE,
            state: GameState::Active,
            started_at,
        })
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.state.is_terminal() {
            return Err(GameError::GameNotActive);
        }
        Ok(())
    }

    /// Reveal one tile: `Active -> Active | Lost | Won`
    pub fn reveal(&mut self, index: u32, calculator: &MultiplierCalculator) -> Result<RevealStep, GameError> {
        self.ensure_active()?;
        let tile_count = self.params.tile_count;
        if index >= tile_count {
            return Err(GameError::TileOutOfRange { index, tile_count });
        }
        if self.revealed.contains(&index) {
            return Err(GameError::TileAlreadyRevealed { index });
        }

        if self.board.is_mine(index) {
            self.state = GameState::Lost;
            self.exploded_at = Some(index);
            return Ok(RevealStep {
                index,
                is_mine: true,
                state: self.state,
                multiplier: self.current_multiplier,
            });
        }

        let revealed = self.revealed.len() as u32 + 1;
        let multiplier = calculator.multiplier(tile_count, self.params.mine_count, revealed)?;

        self.revealed.push(index);
        self.current_multiplier = multiplier;
        if revealed == self.params.safe_tiles() {
            self.state = GameState::Won;
        }

        Ok(RevealStep {
            index,
            is_mine: false,
            state: self.state,
            multiplier,
        })
    }

    /// Player-initiated settlement: `Active -> CashedOut`
    pub fn cashout(&mut self) -> Result<Multiplier, GameError> {
        self.ensure_active()?;
        if self.revealed.is_empty() {
            return Err(GameError::NothingRevealed);
        }
        self.state = GameState::CashedOut;
        Ok(self.current_multiplier)
    }

    /// Mine positions; exposed only once the game is over
    pub fn mine_positions(&self) -> Option<Vec<u32>> {
        self.state.is_terminal().then(|| self.board.mine_positions())
    }

    pub fn exploded_at(&self) -> Option<u32> {
        self.exploded_at
    }
}
