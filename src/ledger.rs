//! Balance ledger
//!
//! Per-player funds are split into `available` and `escrowed`. Stakes move
//! into escrow when a game starts and leave it only through settlement.
//! Withdrawals are capped per transaction and per rolling window; the
//! window restarts at the first withdrawal after it has elapsed.

use crate::common::types::Amount;
use crate::config::LedgerConfig;
use crate::errors::{LedgerError, WithdrawalLimit};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Withdrawal caps applied by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub per_transaction: Amount,
    pub daily: Amount,
    pub window: Duration,
}

impl WithdrawalPolicy {
    pub fn from_config(config: &LedgerConfig) -> Self {
        let window_secs = i64::try_from(config.withdraw_window_secs).unwrap_or(i64::MAX);
        Self {
            per_transaction: config.per_transaction_withdraw_limit,
            daily: config.daily_withdraw_limit,
            window: Duration::try_seconds(window_secs).unwrap_or(Duration::MAX),
        }
    }
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

/// Balance query response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub available: Amount,
    pub escrowed: Amount,
}

/// One player's funds and withdrawal counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    available: Amount,
    escrowed: Amount,
    withdrawn_in_window: Amount,
    window_start: Option<DateTime<Utc>>,
}

impl LedgerBalance {
    pub fn available(&self) -> Amount {
        self.available
    }

    pub fn escrowed(&self) -> Amount {
        self.escrowed
    }

    pub fn view(&self) -> BalanceView {
        BalanceView {
            available: self.available,
            escrowed: self.escrowed,
        }
    }

    /// Credit `available`
    pub fn deposit(&mut self, amount: Amount) -> Result<BalanceView, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        self.available = self
            .available
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { amount })?;
        Ok(self.view())
    }

    /// Window start and amount already withdrawn as seen at `now`
    fn window_at(&self, policy: &WithdrawalPolicy, now: DateTime<Utc>) -> (DateTime<Utc>, Amount) {
        match self.window_start {
            Some(start) if start.checked_add_signed(policy.window).map_or(true, |end| now < end) => {
                (start, self.withdrawn_in_window)
            }
            _ => (now, Amount::ZERO),
        }
    }

    /// How much more may be withdrawn in the current window
    pub fn withdrawal_allowance(&self, policy: &WithdrawalPolicy, now: DateTime<Utc>) -> Amount {
        let (_, withdrawn) = self.window_at(policy, now);
        policy
            .daily
            .saturating_sub(withdrawn)
            .min(policy.per_transaction)
            .min(self.available)
    }

    /// Debit `available`, subject to both withdrawal caps
    pub fn withdraw(
        &mut self,
        amount: Amount,
        policy: &WithdrawalPolicy,
        now: DateTime<Utc>,
    ) -> Result<BalanceView, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        if amount > self.available {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.available,
            });
        }

        let (window_start, withdrawn) = self.window_at(policy, now);
        if amount > policy.per_transaction {
            return Err(LedgerError::WithdrawalLimitExceeded {
                requested: amount,
                limit: WithdrawalLimit::PerTransaction,
                cap: policy.per_transaction,
                already_withdrawn: withdrawn,
            });
        }

        let after = withdrawn.saturating_add(amount);
        if after > policy.daily {
            return Err(LedgerError::WithdrawalLimitExceeded {
                requested: amount,
                limit: WithdrawalLimit::Daily,
                cap: policy.daily,
                already_withdrawn: withdrawn,
            });
        }

        self.available = self.available.saturating_sub(amount);
        self.window_start = Some(window_start);
        self.withdrawn_in_window = after;
        Ok(self.view())
    }

    /// Move a stake from `available` into escrow
    pub(crate) fn escrow(&mut self, stake: Amount) -> Result<(), LedgerError> {
        if stake.is_zero() {
            return Err(LedgerError::InvalidAmount { amount: stake });
        }
        if stake > self.available {
            return Err(LedgerError::InsufficientBalance {
                requested: stake,
                available: self.available,
            });
        }
        self.available = self.available.saturating_sub(stake);
        self.escrowed = self.escrowed.saturating_add(stake);
        Ok(())
    }

    /// Lost game: the escrowed stake leaves the player's books
    pub(crate) fn forfeit(&mut self, stake: Amount) {
        self.escrowed = self.escrowed.saturating_sub(stake);
    }

    /// Winning game: clear the stake from escrow and credit the payout
    pub(crate) fn release_with_payout(&mut self, stake: Amount, payout: Amount) {
        self.escrowed = self.escrowed.saturating_sub(stake);
        self.available = self.available.saturating_add(payout);
    }
}

/// House side of every settlement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseBankroll {
    pub initial_balance: Amount,
    pub total_wagered: Amount,
    pub total_paid_out: Amount,
    pub games_settled: u64,
    pub games_won_by_players: u64,
}

impl HouseBankroll {
    pub fn new(initial_balance: Amount) -> Self {
        Self {
            initial_balance,
            ..Default::default()
        }
    }

    /// Record a settled game; `payout` is zero for a lost game
    pub fn record_settlement(&mut self, stake: Amount, payout: Amount) {
        self.total_wagered = self.total_wagered.saturating_add(stake);
        self.total_paid_out = self.total_paid_out.saturating_add(payout);
        self.games_settled += 1;
        if !payout.is_zero() {
            self.games_won_by_players += 1;
        }
    }

    /// House profit in base units
    pub fn profit(&self) -> i128 {
        i128::from(self.total_wagered.base_units()) - i128::from(self.total_paid_out.base_units())
    }

    /// Current house funds in base units; negative when the house is underwater
    pub fn balance(&self) -> i128 {
        i128::from(self.initial_balance.base_units()) + self.profit()
    }

    /// Realised return to player
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
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn funded(tokens: u64) -> LedgerBalance {
        let mut balance = LedgerBalance::default();
        balance.deposit(Amount::tokens(tokens)).unwrap();
        balance
    }

    #[test]
    fn test_deposit_rejects_zero() {
        let mut balance = LedgerBalance::default();
        assert_eq!(
            balance.deposit(Amount::ZERO),
            Err(LedgerError::InvalidAmount { amount: Amount::ZERO })
        );
        assert_eq!(balance.deposit(Amount::tokens(3)).unwrap().available, Amount::tokens(3));
    }

    #[test]
    fn test_deposit_overflow() {
        let mut balance = LedgerBalance::default();
        balance.deposit(Amount::from_base_units(u64::MAX)).unwrap();
        assert!(matches!(
            balance.deposit(Amount::from_base_units(1)),
            Err(LedgerError::BalanceOverflow { .. })
        ));
        assert_eq!(balance.available(), Amount::from_base_units(u64::MAX));
    }

    #[test]
    fn test_per_transaction_limit() {
        let policy = WithdrawalPolicy::default();
        let mut balance = funded(50);

        let err = balance.withdraw(Amount::tokens(12), &policy, start()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WithdrawalLimitExceeded { limit: WithdrawalLimit::PerTransaction, .. }
        ));
        assert_eq!(balance.available(), Amount::tokens(50));
    }

    #[test]
    fn test_insufficient_balance() {
        let policy = WithdrawalPolicy::default();
        let mut balance = funded(5);
        assert_eq!(
            balance.withdraw(Amount::tokens(6), &policy, start()),
            Err(LedgerError::InsufficientBalance {
                requested: Amount::tokens(6),
                available: Amount::tokens(5),
            })
        );
    }

    #[test]
    fn test_daily_limit_and_window_reset() {
        let policy = WithdrawalPolicy::default();
        let mut balance = funded(500);
        let now = start();

        for _ in 0..20 {
            balance.withdraw(Amount::tokens(10), &policy, now).unwrap();
        }
        let err = balance.withdraw(Amount::tokens(1), &policy, now + Duration::hours(23)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WithdrawalLimitExceeded {
                limit: WithdrawalLimit::Daily,
                already_withdrawn,
                ..
            } if already_withdrawn == Amount::tokens(200)
        ));
        assert_eq!(balance.withdrawal_allowance(&policy, now), Amount::ZERO);

        let later = now + Duration::hours(24);
        assert_eq!(balance.withdrawal_allowance(&policy, later), Amount::tokens(10));
        balance.withdraw(Amount::tokens(10), &policy, later).unwrap();
        assert_eq!(balance.available(), Amount::tokens(290));
    }

    #[test]
    fn test_rejected_withdrawal_keeps_window() {
        let policy = WithdrawalPolicy::default();
        let mut balance = funded(100);
        let now = start();
        balance.withdraw(Amount::tokens(5), &policy, now).unwrap();
        let before = balance.clone();

        assert!(balance
            .withdraw(Amount::tokens(11), &policy, now + Duration::days(2))
            .is_err());
        assert_eq!(balance, before);
    }

    #[test]
    fn test_escrow_and_settle() {
        let mut balance = funded(5);
        assert!(matches!(
            balance.escrow(Amount::tokens(10)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(balance.escrowed(), Amount::ZERO);

        balance.escrow(Amount::tokens(2)).unwrap();
        assert_eq!(balance.view(), BalanceView {
            available: Amount::tokens(3),
            escrowed: Amount::tokens(2),
        });

        balance.release_with_payout(Amount::tokens(2), Amount::tokens(4));
        assert_eq!(balance.view(), BalanceView {
            available: Amount::tokens(7),
            escrowed: Amount::ZERO,
        });

        balance.escrow(Amount::tokens(1)).unwrap();
        balance.forfeit(Amount::tokens(1));
        assert_eq!(balance.view(), BalanceView {
            available: Amount::tokens(6),
            escrowed: Amount::ZERO,
        });
    }

    #[test]
    fn test_house_bankroll() {
        let mut house = HouseBankroll::new(Amount::tokens(1_000));
        house.record_settlement(Amount::tokens(1), Amount::ZERO);
        house.record_settlement(Amount::tokens(1), Amount::from_base_units(150_000_000));

        assert_eq!(house.games_settled, 2);
        assert_eq!(house.games_won_by_players, 1);
        assert_eq!(house.profit(), 50_000_000);
        assert_eq!(house.balance(), 100_050_000_000);
        assert!((house.rtp() - 0.75).abs() < 1e-12);
    }
}
