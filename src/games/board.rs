//! Board generation from a game digest.
//!
//! Mines are drawn with a partial Fisher-Yates shuffle: draw `i` takes
//! `j = hash_i mod (n - i)` over the not-yet-chosen prefix and swaps the pick
//! to the end of that prefix. Every `hash_i` is the first eight bytes of
//! `SHA-256(digest || i_be)`, so the whole layout is a pure function of the
//! digest and the board parameters.

use crate::errors::GameError;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Smallest board: a 2x2 grid
pub const MIN_TILES: u32 = 4;

/// The `i`-th draw of the sub-digest stream
pub fn sub_digest(digest: &[u8; 32], i: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(digest);
    hasher.update(i.to_be_bytes());
    let out = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&out[..8]);
    u64::from_be_bytes(word)
}

/// Side length of a square board, `None` if `tile_count` is not a perfect square
pub fn grid_side(tile_count: u32) -> Option<u32> {
    let side = (tile_count as f64).sqrt().round() as u32;
    [side.saturating_sub(1), side, side + 1]
        .into_iter()
        .find(|s| s.checked_mul(*s) == Some(tile_count))
}

/// Structural checks every board must pass regardless of configuration
pub fn validate_board(tile_count: u32, mine_count: u32) -> Result<(), GameError> {
    let invalid = |reason: &str| GameError::InvalidBoardParameters {
        tile_count,
        mine_count,
        reason: reason.to_string(),
    };

    if tile_count < MIN_TILES {
        return Err(invalid("board needs at least 4 tiles"));
    }
    if grid_side(tile_count).is_none() {
        return Err(invalid("tile count must be a perfect square"));
    }
    if mine_count == 0 || mine_count >= tile_count {
        return Err(invalid("mine count must be between 1 and tile count - 1"));
    }
    Ok(())
}

/// Deterministically place `mine_count` mines on `tile_count` tiles
pub fn generate_mine_positions(
    digest: &[u8; 32],
    tile_count: u32,
    mine_count: u32,
) -> Result<BTreeSet<u32>, GameError> {
    validate_board(tile_count, mine_count)?;

    let mut positions: Vec<u32> = (0..tile_count).collect();
    let mut mines = BTreeSet::new();

    for i in 0..mine_count {
        let remaining = tile_count - i;
        let j = (sub_digest(digest, i) % u64::from(remaining)) as usize;
        let last = (remaining - 1) as usize;
        positions.swap(j, last);
        mines.insert(positions[last]);
    }

    Ok(mines)
}

/// Fixed mine layout of one game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    mines: BTreeSet<u32>,
}

impl Board {
    pub fn generate(digest: &[u8; 32], tile_count: u32, mine_count: u32) -> Result<Self, GameError> {
        let mines = generate_mine_positions(digest, tile_count, mine_count)?;
        Ok(Self { mines })
    }

    pub fn mine_count(&self) -> u32 {
        self.mines.len() as u32
    }

    pub fn is_mine(&self, index: u32) -> bool {
        self.mines.contains(&index)
    }

    pub fn mine_positions(&self) -> Vec<u32> {
        self.mines.iter().copied().collect()
    }
}
