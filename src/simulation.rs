//! Monte-Carlo simulation
//!
//! Plays many automated games through a real engine with a fixed strategy
//! (reveal `reveal_target` random tiles, then cash out) and compares the
//! realised return-to-player with the theoretical value of that strategy.

use crate::common::types::{Amount, PlayerId};
use crate::engine::MinesEngine;
use crate::errors::{GameError, MinesResult};
use crate::games::multiplier::fair_multiplier;
use crate::games::types::{GameParams, GameState, StartGameRequest};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub params: GameParams,
    pub stake: Amount,
    /// Safe reveals before cashing out; the board's safe tile count plays to a perfect game
    pub reveal_target: u32,
    pub games: usize,
    pub players: usize,
    /// Seed for the reveal order, not for the boards
    pub strategy_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: GameParams {
                tile_count: 25,
                mine_count: 5,
            },
            stake: Amount::tokens(1),
            reveal_target: 3,
            games: 1_000,
            players: 4,
            strategy_seed: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub games_played: usize,
    pub games_lost: usize,
    pub games_cashed_out: usize,
    pub perfect_games: usize,
    pub total_wagered: Amount,
    pub total_paid_out: Amount,
    pub realised_rtp: f64,
    pub expected_rtp: f64,
    /// Settled games whose seeds re-derive the archived board
    pub verified_games: usize,
    pub execution_time: Duration,
}

impl SimulationReport {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        (self.games_cashed_out + self.perfect_games) as f64 / self.games_played as f64
    }
}

/// Expected return of "reveal `k` then cash out" under the engine's multiplier
pub fn expected_rtp(engine: &MinesEngine, params: &GameParams, reveal_target: u32) -> MinesResult<f64> {
    let reported = engine
        .calculator()
        .multiplier(params.tile_count, params.mine_count, reveal_target)?;
    let fair = fair_multiplier(params.tile_count, params.mine_count, reveal_target)?;
    Ok(reported.as_f64() / fair.as_f64())
}

pub struct Simulator<'a> {
    engine: &'a MinesEngine,
    config: SimulationConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(engine: &'a MinesEngine, config: SimulationConfig) -> Self {
        Self { engine, config }
    }

    pub fn run(&self) -> MinesResult<SimulationReport> {
        let config = &self.config;
        let params = config.params;
        if config.reveal_target == 0 || config.reveal_target > params.safe_tiles() {
            return Err(GameError::InvalidBoardParameters {
                tile_count: params.tile_count,
                mine_count: params.mine_count,
                reason: format!("reveal target {} is outside 1..={}", config.reveal_target, params.safe_tiles()),
            }
            .into());
        }

        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(config.strategy_seed);
        let players: Vec<PlayerId> = (0..config.players.max(1))
            .map(|n| PlayerId::new(format!("sim-player-{}", n)))
            .collect();

        let mut report = SimulationReport {
            games_played: 0,
            games_lost: 0,
            games_cashed_out: 0,
            perfect_games: 0,
            total_wagered: Amount::ZERO,
            total_paid_out: Amount::ZERO,
            realised_rtp: 0.0,
            expected_rtp: expected_rtp(self.engine, &params, config.reveal_target)?,
            verified_games: 0,
            execution_time: Duration::ZERO,
        };

        let mut tiles: Vec<u32> = (0..params.tile_count).collect();
        for n in 0..config.games {
            let player = &players[n % players.len()];
            self.engine.deposit(player, config.stake)?;
            let seed = format!("{}-{}", player, n);
            self.engine
                .start_game(player, StartGameRequest { params, stake: config.stake, client_seed: seed.into_bytes() })?;

            tiles.shuffle(&mut rng);
            let mut settlement = None;
            for &index in &tiles {
                let outcome = self.engine.reveal_tile(player, index)?;
                if outcome.settlement.is_some() {
                    settlement = outcome.settlement;
                    break;
                }
                if outcome.revealed_count >= config.reveal_target {
                    settlement = Some(self.engine.cashout(player)?);
                    break;
                }
            }

            let Some(record) = settlement else { continue };
            report.games_played += 1;
            match record.state {
                GameState::Lost => report.games_lost += 1,
                GameState::CashedOut => report.games_cashed_out += 1,
                GameState::Won => report.perfect_games += 1,
                GameState::Active => {}
            }
            report.total_wagered = report.total_wagered.saturating_add(record.stake);
            report.total_paid_out = report.total_paid_out.saturating_add(record.amount_won);
            if record.verify().unwrap_or(false) {
                report.verified_games += 1;
            }
        }

        if !report.total_wagered.is_zero() {
            report.realised_rtp =
                report.total_paid_out.base_units() as f64 / report.total_wagered.base_units() as f64;
        }
        report.execution_time = start.elapsed();

        info!(
            games = report.games_played,
            realised_rtp = report.realised_rtp,
            expected_rtp = report.expected_rtp,
            "Simulation finished in {:?}",
            report.execution_time
        );
        Ok(report)
    }
}
