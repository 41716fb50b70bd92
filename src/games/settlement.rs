//! Settlement records.
//!
//! A record is produced exactly once per game, when it reaches a terminal
//! state. It discloses the server seed and the mine layout so the outcome
//! can be checked against the commitment published at start.

use crate::common::types::{Amount, Multiplier, PlayerId};
use crate::games::fairness::{self, FairnessError, VerificationRequest};
use crate::games::types::{Game, GameParams, GameState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Archived outcome of one finished game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementRecord {
    pub game_id: String,
    pub player: PlayerId,
    pub params: GameParams,
    pub stake: Amount,
    pub state: GameState,
    pub won: bool,
    pub amount_won: Amount,
    pub multiplier: Multiplier,
    pub revealed: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploded_at: Option<u32>,
    pub mine_positions: Vec<u32>,
    /// Hex server seed, disclosed after the game ended
    pub server_seed: String,
    pub server_seed_hash: String,
    /// Hex client seed
    pub client_seed: String,
    pub nonce: u64,
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// Build the record for a terminal game; `amount_won` is zero for a loss
    pub(crate) fn from_game(game: &Game, amount_won: Amount, settled_at: DateTime<Utc>) -> Self {
        let won = game.state.is_win();
        Self {
            game_id: game.id.clone(),
            player: game.player.clone(),
            params: game.params,
            stake: game.stake,
            state: game.state,
            won,
            amount_won: if won { amount_won } else { Amount::ZERO },
            multiplier: game.current_multiplier,
            revealed: game.revealed.clone(),
            exploded_at: game.exploded_at,
            mine_positions: game.board.mine_positions(),
            server_seed: game.seeds.server_seed.to_hex(),
            server_seed_hash: game.seeds.server_seed.hash_hex(),
            client_seed: hex::encode(&game.seeds.client_seed),
            nonce: game.seeds.nonce,
            started_at: game.started_at,
            settled_at,
        }
    }

    /// Player profit in base units (negative for a loss)
    pub fn net_result(&self) -> i128 {
        i128::from(self.amount_won.base_units()) - i128::from(self.stake.base_units())
    }

    pub fn verification_request(&self) -> Result<VerificationRequest, FairnessError> {
        let client_seed = hex::decode(&self.client_seed).map_err(|e| FairnessError::InvalidHex(e.to_string()))?;
        Ok(VerificationRequest {
            server_seed: self.server_seed.clone(),
            client_seed,
            nonce: self.nonce,
            tile_count: self.params.tile_count,
            mine_count: self.params.mine_count,
            expected_server_seed_hash: Some(self.server_seed_hash.clone()),
        })
    }

    /// Recompute the commitment and layout from the disclosed seeds
    pub fn verify(&self) -> Result<bool, FairnessError> {
        let report = fairness::verify_game(&self.verification_request()?)?;
        Ok(report.commitment_matches == Some(true) && report.mine_positions == self.mine_positions)
    }
}
