//! Mines wagering engine
//!
//! `MinesEngine` owns every player's ledger balance, active game and seed
//! commitment in one `PlayerAccount` record. Each operation holds that
//! record's map entry for its whole duration, so one player's requests are
//! serialized while different players proceed in parallel. Validation
//! always completes before the first mutation, and a game's terminal
//! transition and its ledger settlement are applied under the same lock.

use crate::common::traits::{Clock, GameArchive, OsSeedSource, SeedSource, SystemClock};
use crate::common::types::{Amount, PlayerId};
use crate::config::EngineConfig;
use crate::errors::{ConfigurationError, GameError, LedgerError, MinesError, MinesResult};
use crate::events::{EngineEvent, EventBus, GameEvent};
use crate::games::board;
use crate::games::fairness::{self, PendingCommitment, SeedCommitment};
use crate::games::multiplier::{MultiplierCalculator, MultiplierStep};
use crate::games::settlement::SettlementRecord;
use crate::games::types::{Game, GameParams, GameSnapshot, GameStarted, RevealOutcome, StartGameRequest};
use crate::ledger::{BalanceView, HouseBankroll, LedgerBalance, WithdrawalPolicy};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::storage::MemoryArchive;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Everything the engine knows about one player
#[derive(Debug, Default)]
struct PlayerAccount {
    balance: LedgerBalance,
    active_game: Option<Game>,
    pending: Option<PendingCommitment>,
    next_nonce: u64,
}

impl PlayerAccount {
    /// Commitment for the next game, drawn on first use
    fn pending_commitment(&mut self, seeds: &dyn SeedSource) -> &PendingCommitment {
        let nonce = self.next_nonce;
        self.pending.get_or_insert_with(|| PendingCommitment::commit(seeds, nonce))
    }
}

pub struct MinesEngine {
    config: EngineConfig,
    calculator: MultiplierCalculator,
    policy: WithdrawalPolicy,
    accounts: DashMap<PlayerId, PlayerAccount>,
    house: Mutex<HouseBankroll>,
    archive: Arc<dyn GameArchive>,
    clock: Arc<dyn Clock>,
    seeds: Arc<dyn SeedSource>,
    events: EventBus,
    metrics: EngineMetrics,
}

impl MinesEngine {
    /// Engine with the wall clock and an in-memory archive
    pub fn new(config: EngineConfig) -> MinesResult<Self> {
        Self::with_components(config, Arc::new(SystemClock), Arc::new(MemoryArchive::new()))
    }

    pub fn with_components(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        archive: Arc<dyn GameArchive>,
    ) -> MinesResult<Self> {
        config
            .validate()
            .map_err(|e| ConfigurationError::ValidationFailed(e.to_string()))?;

        info!(
            house_edge = config.game.house_edge,
            payout_precision = config.game.payout_precision,
            "Mines engine ready"
        );

        Ok(Self {
            calculator: MultiplierCalculator::from_config(&config.game),
            policy: WithdrawalPolicy::from_config(&config.ledger),
            accounts: DashMap::new(),
            house: Mutex::new(HouseBankroll::new(config.ledger.house_initial_balance)),
            archive,
            clock,
            seeds: Arc::new(OsSeedSource),
            events: EventBus::new(config.events.channel_capacity),
            metrics: EngineMetrics::new(),
            config,
        })
    }

    /// Replace the server seed source; only takes effect for commitments
    /// drawn afterwards, so call it before serving players
    pub fn with_seed_source(mut self, seeds: Arc<dyn SeedSource>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculator(&self) -> &MultiplierCalculator {
        &self.calculator
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn publish(&self, event: GameEvent) {
        self.events.publish(event, self.now());
    }

    /// Log and count a rejected request; the error is passed through unchanged
    fn rejected<T>(&self, player: &PlayerId, operation: &str, result: MinesResult<T>) -> MinesResult<T> {
        if let Err(ref e) = result {
            if self.config.monitoring.enable_metrics {
                self.metrics.record_rejection();
            }
            warn!(player = %player, operation, kind = ?e.kind(), "Request rejected: {}", e);
        }
        result
    }

    /// Board parameters allowed by this engine's configuration
    fn validate_params(&self, params: &GameParams) -> Result<(), GameError> {
        board::validate_board(params.tile_count, params.mine_count)?;
        let game = &self.config.game;
        if params.tile_count < game.min_tiles() || params.tile_count > game.max_tiles() {
            return Err(GameError::InvalidBoardParameters {
                tile_count: params.tile_count,
                mine_count: params.mine_count,
                reason: format!(
                    "grid must be between {0}x{0} and {1}x{1}",
                    game.min_grid_size, game.max_grid_size
                ),
            });
        }
        Ok(())
    }

    fn validate_stake(&self, stake: Amount) -> Result<(), GameError> {
        let min_stake = self.config.game.min_stake;
        if stake.is_zero() || stake < min_stake {
            return Err(GameError::StakeTooSmall { stake, min_stake });
        }
        Ok(())
    }

    /// Checks of a start request that do not depend on the player's state
    fn validate_start(&self, params: &GameParams, stake: Amount, client_seed: &[u8]) -> Result<(), GameError> {
        fairness::validate_client_seed(client_seed, self.config.game.max_client_seed_len)?;
        self.validate_params(params)?;
        self.validate_stake(stake)
    }

    /// Hash of the server seed the player's next game will use.
    ///
    /// Query this before choosing a client seed; the engine cannot change the
    /// seed behind it once published. The seed has to be kept until the
    /// player's next start, so this registers unknown players.
    pub fn commitment(&self, player: &PlayerId) -> SeedCommitment {
        let mut account = self.accounts.entry(player.clone()).or_default();
        account.pending_commitment(self.seeds.as_ref()).commitment().clone()
    }

    /// `Idle -> Active`: escrow the stake and fix the board
    pub fn start_game(&self, player: &PlayerId, request: StartGameRequest) -> MinesResult<GameStarted> {
        let result = self.try_start_game(player, request);
        self.rejected(player, "start_game", result)
    }

    fn try_start_game(&self, player: &PlayerId, request: StartGameRequest) -> MinesResult<GameStarted> {
        let StartGameRequest {
            params,
            stake,
            client_seed,
        } = request;

        let Some(mut account) = self.accounts.get_mut(player) else {
            // Unknown player: nothing to stake from, and a rejected start creates no account
            self.validate_start(&params, stake, &client_seed)?;
            return Err(LedgerError::InsufficientBalance {
                requested: stake,
                available: Amount::ZERO,
            }
            .into());
        };
        if let Some(game) = &account.active_game {
            return Err(GameError::GameAlreadyActive {
                game_id: game.id().to_string(),
            }
            .into());
        }
        self.validate_start(&params, stake, &client_seed)?;
        if stake > account.balance.available() {
            return Err(LedgerError::InsufficientBalance {
                requested: stake,
                available: account.balance.available(),
            }
            .into());
        }

        let now = self.now();
        let seeds = account.pending_commitment(self.seeds.as_ref()).clone().bind(client_seed);
        let game = Game::new(player.clone(), params, stake, seeds, now)?;

        // All checks passed; commit
        account.balance.escrow(stake)?;
        account.pending = None;
        account.next_nonce = game.commitment().nonce + 1;

        let started = GameStarted {
            game_id: game.id().to_string(),
            params,
            stake,
            commitment: game.commitment(),
            started_at: now,
        };
        account.active_game = Some(game);

        if self.config.monitoring.enable_metrics {
            self.metrics.record_start(stake);
        }
        info!(
            player = %player,
            game_id = %started.game_id,
            nonce = started.commitment.nonce,
            "Game started: {} staking {}",
            params,
            stake
        );
        self.publish(GameEvent::GameStarted {
            game_id: started.game_id.clone(),
            player: player.clone(),
            params,
            stake,
            server_seed_hash: started.commitment.server_seed_hash.clone(),
            nonce: started.commitment.nonce,
        });

        Ok(started)
    }

    /// `Active -> Active | Lost | Won`
    pub fn reveal_tile(&self, player: &PlayerId, index: u32) -> MinesResult<RevealOutcome> {
        let result = self.try_reveal_tile(player, index);
        self.rejected(player, "reveal_tile", result)
    }

    fn try_reveal_tile(&self, player: &PlayerId, index: u32) -> MinesResult<RevealOutcome> {
        let mut account = self.accounts.get_mut(player).ok_or(GameError::GameNotActive)?;
        let game = account.active_game.as_mut().ok_or(GameError::GameNotActive)?;
        let step = game.reveal(index, &self.calculator)?;
        let game_id = game.id().to_string();
        let revealed_count = game.revealed().len() as u32;

        if self.config.monitoring.enable_metrics {
            self.metrics.record_reveal();
        }
        debug!(
            player = %player,
            game_id = %game_id,
            index,
            is_mine = step.is_mine,
            multiplier = %step.multiplier,
            "Tile revealed"
        );
        self.publish(GameEvent::TileRevealed {
            game_id: game_id.clone(),
            player: player.clone(),
            index,
            is_mine: step.is_mine,
            current_multiplier: step.multiplier,
        });

        let settlement = if step.state.is_terminal() {
            account
                .active_game
                .take()
                .map(|game| self.settle(&mut account, game))
        } else {
            None
        };

        Ok(RevealOutcome {
            game_id,
            index,
            is_mine: step.is_mine,
            state: step.state,
            current_multiplier: step.multiplier,
            revealed_count,
            settlement,
        })
    }

    /// `Active -> CashedOut`
    pub fn cashout(&self, player: &PlayerId) -> MinesResult<SettlementRecord> {
        let result = self.try_cashout(player);
        self.rejected(player, "cashout", result)
    }

    fn try_cashout(&self, player: &PlayerId) -> MinesResult<SettlementRecord> {
        let mut account = self.accounts.get_mut(player).ok_or(GameError::GameNotActive)?;
        let game = account.active_game.as_mut().ok_or(GameError::GameNotActive)?;
        game.cashout()?;

        let game = account.active_game.take().ok_or(GameError::GameNotActive)?;
        Ok(self.settle(&mut account, game))
    }

    /// Release the escrow of a terminal game and archive it.
    ///
    /// Runs under the player's lock and cannot fail: ledger credits saturate.
    fn settle(&self, account: &mut PlayerAccount, game: Game) -> SettlementRecord {
        let now = self.now();
        let stake = game.stake();
        let state = game.state();

        let payout = if state.is_win() {
            self.calculator
                .payout(stake, game.current_multiplier(), self.config.game.max_payout)
        } else {
            Amount::ZERO
        };

        if state.is_win() {
            account.balance.release_with_payout(stake, payout);
        } else {
            account.balance.forfeit(stake);
        }

        let record = SettlementRecord::from_game(&game, payout, now);
        self.house
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_settlement(stake, payout);
        self.archive.archive(record.clone());

        // Fresh commitment so the next game's hash is known before its client seed
        account.pending = Some(PendingCommitment::commit(self.seeds.as_ref(), account.next_nonce));

        if self.config.monitoring.enable_metrics {
            self.metrics.record_settlement(state, payout);
        }
        info!(
            player = %record.player,
            game_id = %record.game_id,
            state = %state,
            multiplier = %record.multiplier,
            "Game settled: stake {} paid {}",
            stake,
            payout
        );
        self.publish(GameEvent::GameEnded {
            game_id: record.game_id.clone(),
            player: record.player.clone(),
            state,
            won: record.won,
            amount_won: record.amount_won,
            server_seed: record.server_seed.clone(),
        });

        record
    }

    /// Credit a player's available balance
    pub fn deposit(&self, player: &PlayerId, amount: Amount) -> MinesResult<BalanceView> {
        let result = self.try_deposit(player, amount);
        self.rejected(player, "deposit", result)
    }

    fn try_deposit(&self, player: &PlayerId, amount: Amount) -> MinesResult<BalanceView> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount { amount }.into());
        }
        let mut account = self.accounts.entry(player.clone()).or_default();
        let view = account.balance.deposit(amount)?;

        if self.config.monitoring.enable_metrics {
            self.metrics.record_deposit(amount);
        }
        debug!(player = %player, "Deposited {}; available {}", amount, view.available);
        self.publish(GameEvent::Deposited {
            player: player.clone(),
            amount,
            balance: view,
        });
        Ok(view)
    }

    /// Debit a player's available balance within the withdrawal limits
    pub fn withdraw(&self, player: &PlayerId, amount: Amount) -> MinesResult<BalanceView> {
        let result = self.try_withdraw(player, amount);
        self.rejected(player, "withdraw", result)
    }

    fn try_withdraw(&self, player: &PlayerId, amount: Amount) -> MinesResult<BalanceView> {
        let now = self.now();
        let Some(mut account) = self.accounts.get_mut(player) else {
            // Unknown player: same verdict as an empty balance, nothing created
            LedgerBalance::default().withdraw(amount, &self.policy, now)?;
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: Amount::ZERO,
            }
            .into());
        };
        let view = account.balance.withdraw(amount, &self.policy, now)?;

        if self.config.monitoring.enable_metrics {
            self.metrics.record_withdrawal(amount);
        }
        debug!(player = %player, "Withdrew {}; available {}", amount, view.available);
        self.publish(GameEvent::Withdrawn {
            player: player.clone(),
            amount,
            balance: view,
        });
        Ok(view)
    }

    pub fn balance(&self, player: &PlayerId) -> BalanceView {
        self.accounts
            .get(player)
            .map(|account| account.balance.view())
            .unwrap_or_default()
    }

    /// Largest withdrawal that would currently be accepted
    pub fn withdrawal_allowance(&self, player: &PlayerId) -> Amount {
        self.accounts
            .get(player)
            .map(|account| account.balance.withdrawal_allowance(&self.policy, self.now()))
            .unwrap_or(Amount::ZERO)
    }

    /// Public view of the player's active game
    pub fn game_snapshot(&self, player: &PlayerId) -> Option<GameSnapshot> {
        let account = self.accounts.get(player)?;
        let game = account.active_game.as_ref()?;
        let potential = self
            .calculator
            .payout(game.stake(), game.current_multiplier(), self.config.game.max_payout);
        Some(game.snapshot(potential))
    }

    /// Settled games of a player, oldest first
    pub fn history(&self, player: &PlayerId) -> Vec<SettlementRecord> {
        self.archive.history(player)
    }

    pub fn find_game(&self, game_id: &str) -> Option<SettlementRecord> {
        self.archive.find(game_id)
    }

    pub fn house(&self) -> HouseBankroll {
        self.house.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Reported multiplier for every number of safe reveals on a board
    pub fn multiplier_table(&self, tile_count: u32, mine_count: u32) -> MinesResult<Vec<MultiplierStep>> {
        let params = GameParams { tile_count, mine_count };
        self.validate_params(&params)?;
        self.calculator
            .table(tile_count, mine_count)
            .map_err(MinesError::from)
    }

    pub fn player_count(&self) -> usize {
        self.accounts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::FixedSeedSource;
    use crate::common::types::Multiplier;
    use crate::errors::ErrorKind;
    use crate::games::fairness::ServerSeed;
    use crate::events::drain_pending;
    use crate::games::types::GameState;

    fn engine() -> MinesEngine {
        MinesEngine::new(EngineConfig::testing()).unwrap()
    }

    fn funded(engine: &MinesEngine, name: &str, tokens: u64) -> PlayerId {
        let player = PlayerId::from(name);
        engine.deposit(&player, Amount::tokens(tokens)).unwrap();
        player
    }

    /// Reveal tiles in index order until the game ends or `target` safe tiles are open
    fn reveal_until(engine: &MinesEngine, player: &PlayerId, target: usize) -> Option<SettlementRecord> {
        for index in 0..25 {
            let outcome = engine.reveal_tile(player, index).unwrap();
            if outcome.settlement.is_some() {
                return outcome.settlement;
            }
            if outcome.revealed_count as usize == target {
                return None;
            }
        }
        None
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.game.house_edge = 2.0;
        assert!(matches!(
            MinesEngine::new(config),
            Err(MinesError::Configuration(ConfigurationError::ValidationFailed(_)))
        ));
    }

    #[test]
    fn test_commitment_is_stable_until_used() {
        let engine = engine();
        let player = funded(&engine, "alice", 10);

        let first = engine.commitment(&player);
        assert_eq!(engine.commitment(&player), first);
        assert_eq!(first.nonce, 0);

        let started = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), "seed"))
            .unwrap();
        assert_eq!(started.commitment, first);
    }

    #[test]
    fn test_start_escrows_stake() {
        let engine = engine();
        let player = funded(&engine, "alice", 10);
        engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(3), "seed"))
            .unwrap();

        assert_eq!(engine.balance(&player), BalanceView {
            available: Amount::tokens(7),
            escrowed: Amount::tokens(3),
        });
        let snapshot = engine.game_snapshot(&player).unwrap();
        assert_eq!(snapshot.state, GameState::Active);
        assert_eq!(snapshot.current_multiplier, Multiplier::ONE);
        assert_eq!(snapshot.potential_payout, Amount::tokens(3));
    }

    #[test]
    fn test_start_validation_order() {
        let engine = engine();
        let player = funded(&engine, "alice", 5);

        let err = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), ""))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSeed));

        let err = engine
            .start_game(&player, StartGameRequest::new(144, 5, Amount::tokens(1), "seed"))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidBoardParameters));

        let err = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::ZERO, "seed"))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidAmount));

        let err = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(10), "seed"))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientBalance));

        assert_eq!(engine.balance(&player).escrowed, Amount::ZERO);
        assert!(engine.game_snapshot(&player).is_none());
        assert_eq!(engine.metrics().rejected_requests, 4);
    }

    #[test]
    fn test_rejected_start_creates_no_account() {
        let engine = engine();
        let ghost = PlayerId::from("ghost");
        let requests = [
            (StartGameRequest::new(25, 5, Amount::tokens(1), ""), ErrorKind::InvalidSeed),
            (StartGameRequest::new(144, 5, Amount::tokens(1), "seed"), ErrorKind::InvalidBoardParameters),
            (StartGameRequest::new(25, 5, Amount::ZERO, "seed"), ErrorKind::InvalidAmount),
            (StartGameRequest::new(25, 5, Amount::tokens(1), "seed"), ErrorKind::InsufficientBalance),
        ];
        for (request, kind) in requests {
            assert_eq!(engine.start_game(&ghost, request).unwrap_err().kind(), Some(kind));
            assert_eq!(engine.player_count(), 0);
        }
        assert_eq!(engine.balance(&ghost), BalanceView::default());
        assert_eq!(engine.metrics().rejected_requests, 4);

        // A published commitment keeps its seed, so the player is registered
        let commitment = engine.commitment(&ghost);
        assert_eq!(engine.player_count(), 1);
        let err = engine
            .start_game(&ghost, StartGameRequest::new(25, 5, Amount::tokens(1), "seed"))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientBalance));
        assert_eq!(engine.commitment(&ghost), commitment);
        assert_eq!(engine.player_count(), 1);
    }

    #[test]
    fn test_seed_source_fixes_the_board() {
        let seed = ServerSeed::from_bytes([3u8; 32]);
        let engine = engine().with_seed_source(Arc::new(FixedSeedSource::new(seed.clone())));
        let player = funded(&engine, "alice", 10);

        let commitment = engine.commitment(&player);
        assert_eq!(commitment.server_seed_hash, seed.hash_hex());

        engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), "pinned"))
            .unwrap();
        let mines = board::generate_mine_positions(&fairness::game_digest(&seed, b"pinned", 0), 25, 5).unwrap();
        let mine = *mines.iter().next().unwrap();

        let outcome = engine.reveal_tile(&player, mine).unwrap();
        assert!(outcome.is_mine);
        let record = outcome.settlement.unwrap();
        assert_eq!(record.server_seed, seed.to_hex());
        assert_eq!(record.mine_positions, mines.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_second_start_rejected() {
        let engine = engine();
        let player = funded(&engine, "alice", 10);
        let started = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), "seed"))
            .unwrap();

        let err = engine
            .start_game(&player, StartGameRequest::new(25, 5, Amount::tokens(1), "seed"))
            .unwrap_err();
        assert_eq!(
            err,
            MinesError::Game(GameError::GameAlreadyActive {
                game_id: started.game_id
            })
        );
        assert_eq!(engine.balance(&player).escrowed, Amount::tokens(1));
    }

    #[test]
    fn test_reveal_without_game() {
        let engine = engine();
        let player = PlayerId::from("nobody");
        assert_eq!(
            engine.reveal_tile(&player, 0).unwrap_err().kind(),
            Some(ErrorKind::GameNotActive)
        );
        assert_eq!(engine.cashout(&player).unwrap_err().kind(), Some(ErrorKind::GameNotActive));
        assert_eq!(engine.player_count(), 0);
    }

    #[test]
    fn test_settlement_returns_to_idle_and_rotates_commitment() {
        let engine = engine();
        let player = funded(&engine, "alice", 10);
        let first = engine.commitment(&player);
        engine
            .start_game(&player, StartGameRequest::new(4, 1, Amount::tokens(1), "seed"))
            .unwrap();

        let record = reveal_until(&engine, &player, 3).unwrap();
        assert!(record.state.is_terminal());
        assert_eq!(record.server_seed_hash, first.server_seed_hash);
        assert_eq!(record.verify(), Ok(true));
        assert!(engine.game_snapshot(&player).is_none());
        assert_eq!(engine.balance(&player).escrowed, Amount::ZERO);

        let next = engine.commitment(&player);
        assert_eq!(next.nonce, 1);
        assert_ne!(next.server_seed_hash, first.server_seed_hash);
        assert_eq!(engine.history(&player), vec![record.clone()]);
        assert_eq!(engine.find_game(&record.game_id), Some(record));
    }

    #[test]
    fn test_events_follow_game() {
        let engine = engine();
        let mut rx = engine.subscribe();
        let player = funded(&engine, "alice", 10);
        engine
            .start_game(&player, StartGameRequest::new(4, 3, Amount::tokens(1), "seed"))
            .unwrap();
        let record = reveal_until(&engine, &player, 1).unwrap();

        let events = drain_pending(&mut rx);
        assert!(matches!(events[0].event, GameEvent::Deposited { .. }));
        assert!(matches!(events[1].event, GameEvent::GameStarted { .. }));
        match &events.last().unwrap().event {
            GameEvent::GameEnded { won, amount_won, .. } => {
                assert_eq!(*won, record.won);
                assert_eq!(*amount_won, record.amount_won);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(events.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[test]
    fn test_house_tracks_settlements() {
        let engine = engine();
        let player = funded(&engine, "alice", 10);
        engine
            .start_game(&player, StartGameRequest::new(4, 3, Amount::tokens(1), "seed"))
            .unwrap();
        let record = reveal_until(&engine, &player, 1).unwrap();

        let house = engine.house();
        assert_eq!(house.games_settled, 1);
        assert_eq!(house.total_wagered, Amount::tokens(1));
        assert_eq!(house.total_paid_out, record.amount_won);
        assert_eq!(engine.balance(&player).available, Amount::tokens(9).saturating_add(record.amount_won));
    }

    #[test]
    fn test_withdraw_unknown_player() {
        let engine = engine();
        let player = PlayerId::from("ghost");
        assert_eq!(
            engine.withdraw(&player, Amount::ZERO).unwrap_err().kind(),
            Some(ErrorKind::InvalidAmount)
        );
        assert_eq!(
            engine.withdraw(&player, Amount::tokens(1)).unwrap_err().kind(),
            Some(ErrorKind::InsufficientBalance)
        );
        assert_eq!(engine.player_count(), 0);
        assert_eq!(engine.withdrawal_allowance(&player), Amount::ZERO);
    }

    #[test]
    fn test_multiplier_table_respects_grid_bounds() {
        let engine = engine();
        assert_eq!(engine.multiplier_table(25, 5).unwrap().len(), 21);
        assert_eq!(
            engine.multiplier_table(121, 5).unwrap_err().kind(),
            Some(ErrorKind::InvalidBoardParameters)
        );
    }
}
