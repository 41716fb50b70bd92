//! Payout multiplier math.
//!
//! After `k` safe reveals the fair multiplier is the inverse survival
//! probability `prod_{i<k} (n - i) / (n - m - i)`. The reported multiplier
//! applies the house edge and is truncated toward zero to the configured
//! precision. All products are exact big integers; every division floors.

use crate::common::types::{Amount, Multiplier};
use crate::config::GameConfig;
use crate::errors::GameError;
use crate::games::board;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use serde::{Deserialize, Serialize};

const PPM: u64 = 1_000_000;

/// Exact fair multiplier after `revealed` safe tiles as `(numerator, denominator)`
pub fn fair_ratio(tile_count: u32, mine_count: u32, revealed: u32) -> Result<(BigUint, BigUint), GameError> {
    board::validate_board(tile_count, mine_count)?;
    let safe_tiles = tile_count - mine_count;
    if revealed > safe_tiles {
        return Err(GameError::InvalidBoardParameters {
            tile_count,
            mine_count,
            reason: format!("{} reveals exceed the {} safe tiles", revealed, safe_tiles),
        });
    }

    let mut num = BigUint::one();
    let mut den = BigUint::one();
    for i in 0..revealed {
        num *= tile_count - i;
        den *= safe_tiles - i;
    }
    Ok((num, den))
}

fn to_multiplier(value: BigUint) -> Multiplier {
    Multiplier::from_scaled(value.to_u128().unwrap_or(u128::MAX))
}

/// Fair multiplier with no house edge, floored to 8 decimals
pub fn fair_multiplier(tile_count: u32, mine_count: u32, revealed: u32) -> Result<Multiplier, GameError> {
    let (num, den) = fair_ratio(tile_count, mine_count, revealed)?;
    Ok(to_multiplier(num * Multiplier::SCALE / den))
}

/// One row of a multiplier table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiplierStep {
    pub revealed: u32,
    pub multiplier: Multiplier,
    pub fair_multiplier: Multiplier,
    /// Chance of surviving every reveal so far
    pub survival_probability: f64,
}

/// House-edge multiplier calculator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiplierCalculator {
    house_edge_ppm: u64,
    precision: u8,
}

impl MultiplierCalculator {
    pub fn new(house_edge_ppm: u64, precision: u8) -> Self {
        Self {
            house_edge_ppm,
            precision: precision.min(Multiplier::DECIMALS),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.house_edge_ppm(), config.payout_precision)
    }

    pub fn house_edge_ppm(&self) -> u64 {
        self.house_edge_ppm
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Reported multiplier after `revealed` safe tiles, never below 1.0
    pub fn multiplier(&self, tile_count: u32, mine_count: u32, revealed: u32) -> Result<Multiplier, GameError> {
        let (num, den) = fair_ratio(tile_count, mine_count, revealed)?;
        if revealed == 0 {
            return Ok(Multiplier::ONE);
        }

        let scaled = num * self.house_edge_ppm * Multiplier::SCALE / (den * PPM);
        let reported = to_multiplier(scaled).truncate_to(self.precision);
        Ok(reported.max(Multiplier::ONE))
    }

    /// `floor(stake * multiplier)`, clamped to `max_payout` when set
    pub fn payout(&self, stake: Amount, multiplier: Multiplier, max_payout: Option<Amount>) -> Amount {
        let raw = BigUint::from(stake.base_units()) * multiplier.scaled() / Multiplier::SCALE;
        let amount = Amount::from_base_units(raw.to_u64().unwrap_or(u64::MAX));
        match max_payout {
            Some(cap) => amount.min(cap),
            None => amount,
        }
    }

    /// Every step from zero reveals to a perfect game
    pub fn table(&self, tile_count: u32, mine_count: u32) -> Result<Vec<MultiplierStep>, GameError> {
        board::validate_board(tile_count, mine_count)?;
        (0..=tile_count - mine_count)
            .map(|revealed| {
                let fair = fair_multiplier(tile_count, mine_count, revealed)?;
                Ok(MultiplierStep {
                    revealed,
                    multiplier: self.multiplier(tile_count, mine_count, revealed)?,
                    fair_multiplier: fair,
                    survival_probability: 1.0 / fair.as_f64(),
                })
            })
            .collect()
    }
}

impl Default for MultiplierCalculator {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}
