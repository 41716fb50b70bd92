//! Engine counters

use crate::common::types::Amount;
use crate::games::types::GameState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct EngineMetrics {
    start_time: Instant,
    games_started: AtomicU64,
    games_lost: AtomicU64,
    games_won: AtomicU64,
    games_cashed_out: AtomicU64,
    reveals: AtomicU64,
    rejected_requests: AtomicU64,
    total_wagered: AtomicU64,
    total_paid_out: AtomicU64,
    total_deposited: AtomicU64,
    total_withdrawn: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            games_started: AtomicU64::new(0),
            games_lost: AtomicU64::new(0),
            games_won: AtomicU64::new(0),
            games_cashed_out: AtomicU64::new(0),
            reveals: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            total_wagered: AtomicU64::new(0),
            total_paid_out: AtomicU64::new(0),
            total_deposited: AtomicU64::new(0),
            total_withdrawn: AtomicU64::new(0),
        }
    }

    fn add(counter: &AtomicU64, amount: Amount) {
        let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
            Some(v.saturating_add(amount.base_units()))
        });
    }

    pub fn record_start(&self, stake: Amount) {
        self.games_started.fetch_add(1, Ordering::Relaxed);
        Self::add(&self.total_wagered, stake);
    }

    pub fn record_reveal(&self) {
        self.reveals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settlement(&self, state: GameState, payout: Amount) {
        let counter = match state {
            GameState::Lost => &self.games_lost,
            GameState::Won => &self.games_won,
            GameState::CashedOut => &self.games_cashed_out,
            GameState::Active => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Self::add(&self.total_paid_out, payout);
    }

    pub fn record_rejection(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deposit(&self, amount: Amount) {
        Self::add(&self.total_deposited, amount);
    }

    pub fn record_withdrawal(&self, amount: Amount) {
        Self::add(&self.total_withdrawn, amount);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            games_started: self.games_started.load(Ordering::Relaxed),
            games_lost: self.games_lost.load(Ordering::Relaxed),
            games_won: self.games_won.load(Ordering::Relaxed),
            games_cashed_out: self.games_cashed_out.load(Ordering::Relaxed),
            reveals: self.reveals.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            total_wagered: Amount::from_base_units(self.total_wagered.load(Ordering::Relaxed)),
            total_paid_out: Amount::from_base_units(self.total_paid_out.load(Ordering::Relaxed)),
            total_deposited: Amount::from_base_units(self.total_deposited.load(Ordering::Relaxed)),
            total_withdrawn: Amount::from_base_units(self.total_withdrawn.load(Ordering::Relaxed)),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub games_started: u64,
    pub games_lost: u64,
    pub games_won: u64,
    pub games_cashed_out: u64,
    pub reveals: u64,
    pub rejected_requests: u64,
    pub total_wagered: Amount,
    pub total_paid_out: Amount,
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
    pub uptime_secs: u64,
}

impl MetricsSnapshot {
    pub fn games_settled(&self) -> u64 {
        self.games_lost + self.games_won + self.games_cashed_out
    }

    pub fn active_games(&self) -> u64 {
        self.games_started.saturating_sub(self.games_settled())
    }

    /// Paid out over wagered; stakes of running games count as wagered
    pub fn rtp(&self) -> f64 {
        if self.total_wagered.is_zero() {
            return 0.0;
        }
        self.total_paid_out.base_units() as f64 / self.total_wagered.base_units() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = EngineMetrics::new();
        metrics.record_start(Amount::tokens(2));
        metrics.record_start(Amount::tokens(2));
        metrics.record_reveal();
        metrics.record_settlement(GameState::Lost, Amount::ZERO);
        metrics.record_settlement(GameState::CashedOut, Amount::tokens(3));
        metrics.record_settlement(GameState::Active, Amount::tokens(100));
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.games_settled(), 2);
        assert_eq!(snapshot.active_games(), 0);
        assert_eq!(snapshot.total_paid_out, Amount::tokens(3));
        assert_eq!(snapshot.rejected_requests, 1);
        assert!((snapshot.rtp() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_saturating_totals() {
        let metrics = EngineMetrics::new();
        metrics.record_deposit(Amount::from_base_units(u64::MAX));
        metrics.record_deposit(Amount::tokens(1));
        assert_eq!(metrics.snapshot().total_deposited, Amount::from_base_units(u64::MAX));
    }
}
