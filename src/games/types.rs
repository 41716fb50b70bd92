use crate::common::types::{Amount, Multiplier, PlayerId};
use crate::errors::GameError;
use crate::games::board::{self, Board};
use crate::games::fairness::{SeedCommitment, SeedPair};
use crate::games::settlement::SettlementRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Board dimensions of one game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameParams {
    pub tile_count: u32,
    pub mine_count: u32,
}

impl GameParams {
    pub fn new(tile_count: u32, mine_count: u32) -> Result<Self, GameError> {
        board::validate_board(tile_count, mine_count)?;
        Ok(Self { tile_count, mine_count })
    }

    /// Side length of the square grid (0 if the tile count is not square)
    pub fn grid_size(&self) -> u32 {
        board::grid_side(self.tile_count).unwrap_or(0)
    }

    pub fn safe_tiles(&self) -> u32 {
        self.tile_count.saturating_sub(self.mine_count)
    }
}

impl fmt::Display for GameParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.grid_size();
        write!(f, "{}x{} with {} mines", side, side, self.mine_count)
    }
}

/// Preset difficulties on the classic 5x5 board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const TILE_COUNT: u32 = 25;

    pub fn mine_count(&self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 7,
            Difficulty::Expert => 10,
        }
    }

    pub fn params(&self) -> GameParams {
        GameParams {
            tile_count: Self::TILE_COUNT,
            mine_count: self.mine_count(),
        }
    }

    pub fn all() -> [Difficulty; 4] {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Expert]
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => {
                let known: Vec<String> = Difficulty::all().iter().map(|d| d.to_string()).collect();
                Err(format!("unknown difficulty '{}', expected one of {}", other, known.join(", ")))
            }
        }
    }
}

/// Lifecycle of a game; "idle" is the absence of a game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Active,
    /// Mine revealed
    Lost,
    /// Every safe tile revealed
    Won,
    CashedOut,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameState::Active)
    }

    /// Terminal states that pay the player
    pub fn is_win(&self) -> bool {
        matches!(self, GameState::Won | GameState::CashedOut)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Active => write!(f, "active"),
            GameState::Lost => write!(f, "lost"),
            GameState::Won => write!(f, "won"),
            GameState::CashedOut => write!(f, "cashed_out"),
        }
    }
}

/// Request to start a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub params: GameParams,
    pub stake: Amount,
    pub client_seed: Vec<u8>,
}

impl StartGameRequest {
    pub fn new(tile_count: u32, mine_count: u32, stake: Amount, client_seed: impl Into<Vec<u8>>) -> Self {
        Self {
            params: GameParams { tile_count, mine_count },
            stake,
            client_seed: client_seed.into(),
        }
    }
}

/// One wagering round. The mine layout and server seed stay private.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) id: String,
    pub(crate) player: PlayerId,
    pub(crate) params: GameParams,
    pub(crate) stake: Amount,
    pub(crate) seeds: SeedPair,
    pub(crate) board: Board,
    pub(crate) revealed: Vec<u32>,
    pub(crate) exploded_at: Option<u32>,
    pub(crate) current_multiplier: Multiplier,
    pub(crate) state: GameState,
    pub(crate) started_at: DateTime<Utc>,
}

impl Game {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> GameParams {
        self.params
    }

    pub fn stake(&self) -> Amount {
        self.stake
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Revealed safe tiles in reveal order
    pub fn revealed(&self) -> &[u32] {
        &self.revealed
    }

    pub fn current_multiplier(&self) -> Multiplier {
        self.current_multiplier
    }

    pub fn commitment(&self) -> SeedCommitment {
        self.seeds.commitment()
    }

    /// Public view; never includes mine positions or the server seed
    pub fn snapshot(&self, potential_payout: Amount) -> GameSnapshot {
        let commitment = self.commitment();
        GameSnapshot {
            game_id: self.id.clone(),
            player: self.player.clone(),
            params: self.params,
            stake: self.stake,
            state: self.state,
            revealed: self.revealed.clone(),
            current_multiplier: self.current_multiplier,
            potential_payout,
            server_seed_hash: commitment.server_seed_hash,
            nonce: commitment.nonce,
            started_at: self.started_at,
        }
    }
}

/// What a player can see of a running game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub game_id: String,
    pub player: PlayerId,
    pub params: GameParams,
    pub stake: Amount,
    pub state: GameState,
    pub revealed: Vec<u32>,
    pub current_multiplier: Multiplier,
    /// Payout if the player cashed out now
    pub potential_payout: Amount,
    pub server_seed_hash: String,
    pub nonce: u64,
    pub started_at: DateTime<Utc>,
}

/// Response to a successful start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStarted {
    pub game_id: String,
    pub params: GameParams,
    pub stake: Amount,
    pub commitment: SeedCommitment,
    pub started_at: DateTime<Utc>,
}

/// Response to a reveal; `settlement` is set when the reveal ended the game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevealOutcome {
    pub game_id: String,
    pub index: u32,
    pub is_mine: bool,
    pub state: GameState,
    pub current_multiplier: Multiplier,
    pub revealed_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        let params = GameParams::new(25, 5).unwrap();
        assert_eq!(params.grid_size(), 5);
        assert_eq!(params.safe_tiles(), 20);
        assert_eq!(params.to_string(), "5x5 with 5 mines");
        assert!(GameParams::new(20, 5).is_err());
    }

    #[test]
    fn test_difficulty_presets() {
        let mines: Vec<u32> = Difficulty::all().iter().map(|d| d.mine_count()).collect();
        assert_eq!(mines, vec![3, 5, 7, 10]);
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(
            "insane".parse::<Difficulty>(),
            Err("unknown difficulty 'insane', expected one of easy, medium, hard, expert".to_string())
        );
        assert!(Difficulty::all().iter().all(|d| GameParams::new(25, d.mine_count()).is_ok()));
    }

    #[test]
    fn test_game_state_terminal() {
        assert!(!GameState::Active.is_terminal());
        assert!(GameState::Lost.is_terminal());
        assert!(GameState::CashedOut.is_win());
        assert!(!GameState::Lost.is_win());
        assert_eq!(serde_json::to_string(&GameState::CashedOut).unwrap(), "\"cashed_out\"");
    }
}
