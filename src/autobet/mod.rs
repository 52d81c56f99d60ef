//! Auto-bet manager.
//!
//! Drives a capped sequence of automated bets across rounds, adjusting the
//! stake after each settled result and halting on user-configured stop
//! thresholds. All state is in memory and scoped to one player session.

pub mod handle;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::RoundResult;

/// Smallest stake the manager will ever place.
pub const MIN_BET: Decimal = dec!(1);

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Auto-bet configuration. Immutable once handed to the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoBetSettings {
    /// Initial stake per round.
    pub amount: Decimal,
    /// Number of rounds to play before stopping.
    pub rounds: u32,
    /// Stop once cumulative winnings reach this amount.
    #[serde(default)]
    pub stop_on_win: Option<Decimal>,
    /// Stop once cumulative losses reach this amount.
    #[serde(default)]
    pub stop_on_loss: Option<Decimal>,
    /// Percent to grow the stake by after a win (ignored with `reset_after_win`).
    #[serde(default)]
    pub increase_on_win: Option<Decimal>,
    /// Percent to grow the stake by after a loss.
    #[serde(default)]
    pub increase_on_loss: Option<Decimal>,
    /// Return to the initial stake after every win.
    #[serde(default)]
    pub reset_after_win: bool,
    /// Cash out automatically once the multiplier reaches this value.
    #[serde(default)]
    pub auto_cashout: Option<f64>,
}

impl AutoBetSettings {
    /// Minimal settings: fixed stake, no stop thresholds, no cash-out rule.
    pub fn new(amount: Decimal, rounds: u32) -> Self {
        Self {
            amount,
            rounds,
            stop_on_win: None,
            stop_on_loss: None,
            increase_on_win: None,
            increase_on_loss: None,
            reset_after_win: false,
            auto_cashout: None,
        }
    }

    /// The initial stake, clamped to [`MIN_BET`].
    pub fn initial_amount(&self) -> Decimal {
        self.amount.max(MIN_BET)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of the manager, for logging and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoBetSnapshot {
    pub active: bool,
    pub rounds_remaining: u32,
    pub current_bet_amount: Decimal,
    pub total_won: Decimal,
    pub total_lost: Decimal,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct AutoBetManager {
    settings: AutoBetSettings,
    active: bool,
    rounds_remaining: u32,
    current_bet_amount: Decimal,
    total_won: Decimal,
    total_lost: Decimal,
}

impl AutoBetManager {
    pub fn new(settings: AutoBetSettings) -> Self {
        let current_bet_amount = settings.initial_amount();
        let rounds_remaining = settings.rounds;
        Self {
            settings,
            active: false,
            rounds_remaining,
            current_bet_amount,
            total_won: Decimal::ZERO,
            total_lost: Decimal::ZERO,
        }
    }

    pub fn settings(&self) -> &AutoBetSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.rounds_remaining
    }

    pub fn current_bet_amount(&self) -> Decimal {
        self.current_bet_amount
    }

    pub fn total_won(&self) -> Decimal {
        self.total_won
    }

    pub fn total_lost(&self) -> Decimal {
        self.total_lost
    }

    /// Begin a fresh run from the configured initial values.
    pub fn start(&mut self) {
        self.rounds_remaining = self.settings.rounds;
        self.current_bet_amount = self.settings.initial_amount();
        self.total_won = Decimal::ZERO;
        self.total_lost = Decimal::ZERO;
        self.active = true;
        info!(
            rounds = self.rounds_remaining,
            amount = %self.current_bet_amount,
            auto_cashout = ?self.settings.auto_cashout,
            "Auto-bet started"
        );
    }

    /// Pause without touching counters.
    pub fn stop(&mut self) {
        if self.active {
            info!(
                rounds_remaining = self.rounds_remaining,
                total_won = %self.total_won,
                total_lost = %self.total_lost,
                "Auto-bet stopped"
            );
        }
        self.active = false;
    }

    pub fn should_continue_betting(&self) -> bool {
        if !self.active || self.rounds_remaining == 0 {
            return false;
        }
        if let Some(limit) = self.settings.stop_on_win {
            if self.total_won >= limit {
                return false;
            }
        }
        if let Some(limit) = self.settings.stop_on_loss {
            if self.total_lost >= limit {
                return false;
            }
        }
        true
    }

    /// Apply a settled result. No-op while inactive.
    pub fn process_round_result(&mut self, result: &RoundResult) {
        if !self.active {
            debug!(%result, "Auto-bet inactive, result ignored");
            return;
        }

        self.rounds_remaining = self.rounds_remaining.saturating_sub(1);

        if result.won {
            self.total_won = self.total_won.saturating_add(result.amount);
            if self.settings.reset_after_win {
                self.current_bet_amount = self.settings.initial_amount();
            } else if let Some(pct) = self.settings.increase_on_win {
                self.current_bet_amount = grown(self.current_bet_amount, pct);
            }
        } else {
            self.total_lost = self.total_lost.saturating_add(result.amount);
            if let Some(pct) = self.settings.increase_on_loss {
                self.current_bet_amount = grown(self.current_bet_amount, pct);
            }
        }

        self.current_bet_amount = self.current_bet_amount.max(MIN_BET);

        debug!(
            %result,
            next_bet = %self.current_bet_amount,
            rounds_remaining = self.rounds_remaining,
            total_won = %self.total_won,
            total_lost = %self.total_lost,
            "Auto-bet result processed"
        );
    }

    pub fn should_cash_out(&self, multiplier: f64) -> bool {
        match self.settings.auto_cashout {
            Some(target) => self.active && multiplier >= target,
            None => false,
        }
    }

    pub fn snapshot(&self) -> AutoBetSnapshot {
        AutoBetSnapshot {
            active: self.active,
            rounds_remaining: self.rounds_remaining,
            current_bet_amount: self.current_bet_amount,
            total_won: self.total_won,
            total_lost: self.total_lost,
        }
    }
}

/// `floor(current * pct / 100)`, or `None` when it does not fit in a `Decimal`.
fn grow_by(current: Decimal, pct: Decimal) -> Option<Decimal> {
    current
        .checked_mul(pct)?
        .checked_div(dec!(100))
        .map(|inc| inc.floor())
}

/// `current + grow_by(current, pct)`, saturating at `Decimal::MAX`.
fn grown(current: Decimal, pct: Decimal) -> Decimal {
    match grow_by(current, pct).and_then(|inc| current.checked_add(inc)) {
        Some(next) => next,
        None => {
            warn!(%current, %pct, "Stake growth overflowed, capping at the largest stake");
            Decimal::MAX
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn started(settings: AutoBetSettings) -> AutoBetManager {
        let mut m = AutoBetManager::new(settings);
        m.start();
        m
    }

    #[test]
    fn test_reset_after_win_example() {
        let mut settings = AutoBetSettings::new(dec!(10), 3);
        settings.reset_after_win = true;
        let mut m = started(settings);

        m.process_round_result(&RoundResult::win(dec!(10)));

        assert_eq!(m.current_bet_amount(), dec!(10));
        assert_eq!(m.rounds_remaining(), 2);
    }

    #[test]
    fn test_rounds_remaining_saturates() {
        let mut m = started(AutoBetSettings::new(dec!(5), 2));
        for _ in 0..5 {
            m.process_round_result(&RoundResult::loss(dec!(5)));
        }
        assert_eq!(m.rounds_remaining(), 0);
        assert!(!m.should_continue_betting());
    }

    #[test]
    fn test_increase_on_loss_floors() {
        let mut settings = AutoBetSettings::new(dec!(15), 10);
        settings.increase_on_loss = Some(dec!(50));
        let mut m = started(settings);

        // 15 * 0.5 = 7.5 → 7
        m.process_round_result(&RoundResult::loss(dec!(15)));
        assert_eq!(m.current_bet_amount(), dec!(22));

        // 22 * 0.5 = 11
        m.process_round_result(&RoundResult::loss(dec!(22)));
        assert_eq!(m.current_bet_amount(), dec!(33));
    }

    #[test]
    fn test_increase_on_win_without_reset() {
        let mut settings = AutoBetSettings::new(dec!(10), 10);
        settings.increase_on_win = Some(dec!(25));
        let mut m = started(settings);

        m.process_round_result(&RoundResult::win(dec!(8)));
        assert_eq!(m.current_bet_amount(), dec!(12));
    }

    #[test]
    fn test_reset_takes_precedence_over_increase_on_win() {
        let mut settings = AutoBetSettings::new(dec!(10), 10);
        settings.increase_on_loss = Some(dec!(100));
        settings.increase_on_win = Some(dec!(100));
        settings.reset_after_win = true;
        let mut m = started(settings);

        m.process_round_result(&RoundResult::loss(dec!(10)));
        assert_eq!(m.current_bet_amount(), dec!(20));
        m.process_round_result(&RoundResult::win(dec!(20)));
        assert_eq!(m.current_bet_amount(), dec!(10));
    }

    #[test]
    fn test_small_stake_never_below_one() {
        let mut settings = AutoBetSettings::new(dec!(1), 5);
        settings.increase_on_loss = Some(dec!(10));
        let mut m = started(settings);

        // floor(1 * 0.1) = 0, stake stays at 1
        m.process_round_result(&RoundResult::loss(dec!(1)));
        assert_eq!(m.current_bet_amount(), dec!(1));
    }

    #[test]
    fn test_negative_amount_clamped() {
        let m = started(AutoBetSettings::new(dec!(-20), 3));
        assert_eq!(m.current_bet_amount(), MIN_BET);
    }

    #[test]
    fn test_stop_on_win_threshold() {
        let mut settings = AutoBetSettings::new(dec!(10), 100);
        settings.stop_on_win = Some(dec!(25));
        let mut m = started(settings);

        m.process_round_result(&RoundResult::win(dec!(15)));
        assert!(m.should_continue_betting());
        m.process_round_result(&RoundResult::win(dec!(10)));
        assert!(!m.should_continue_betting());
        assert_eq!(m.rounds_remaining(), 98);
    }

    #[test]
    fn test_stop_on_loss_threshold() {
        let mut settings = AutoBetSettings::new(dec!(10), 100);
        settings.stop_on_loss = Some(dec!(30));
        let mut m = started(settings);

        m.process_round_result(&RoundResult::loss(dec!(10)));
        m.process_round_result(&RoundResult::loss(dec!(10)));
        assert!(m.should_continue_betting());
        m.process_round_result(&RoundResult::loss(dec!(10)));
        assert!(!m.should_continue_betting());
    }

    #[test]
    fn test_inactive_manager_ignores_results() {
        let mut m = AutoBetManager::new(AutoBetSettings::new(dec!(10), 3));
        m.process_round_result(&RoundResult::loss(dec!(10)));
        assert_eq!(m.rounds_remaining(), 3);
        assert_eq!(m.total_lost(), Decimal::ZERO);
        assert!(!m.should_continue_betting());
    }

    #[test]
    fn test_stop_keeps_counters() {
        let mut settings = AutoBetSettings::new(dec!(10), 5);
        settings.increase_on_loss = Some(dec!(100));
        let mut m = started(settings);
        m.process_round_result(&RoundResult::loss(dec!(10)));
        m.stop();

        assert!(!m.is_active());
        assert_eq!(m.rounds_remaining(), 4);
        assert_eq!(m.current_bet_amount(), dec!(20));
        assert!(!m.should_continue_betting());
    }

    #[test]
    fn test_start_resets_run() {
        let mut settings = AutoBetSettings::new(dec!(10), 5);
        settings.increase_on_loss = Some(dec!(100));
        settings.stop_on_loss = Some(dec!(10));
        let mut m = started(settings);
        m.process_round_result(&RoundResult::loss(dec!(10)));
        assert!(!m.should_continue_betting());

        m.start();
        assert_eq!(m.rounds_remaining(), 5);
        assert_eq!(m.current_bet_amount(), dec!(10));
        assert_eq!(m.total_lost(), Decimal::ZERO);
        assert!(m.should_continue_betting());
    }

    #[test]
    fn test_should_cash_out() {
        let mut settings = AutoBetSettings::new(dec!(10), 5);
        settings.auto_cashout = Some(2.0);
        let mut m = AutoBetManager::new(settings);

        assert!(!m.should_cash_out(3.0), "inactive never cashes out");
        m.start();
        assert!(!m.should_cash_out(1.99));
        assert!(m.should_cash_out(2.0));
        assert!(m.should_cash_out(5.0));
    }

    #[test]
    fn test_no_cashout_target() {
        let m = started(AutoBetSettings::new(dec!(10), 5));
        assert!(!m.should_cash_out(100.0));
    }

    #[test]
    fn test_long_losing_streak_saturates_stake() {
        let mut settings = AutoBetSettings::new(dec!(10), 200);
        settings.increase_on_loss = Some(dec!(100));
        let mut m = started(settings);

        for _ in 0..200 {
            m.process_round_result(&RoundResult::loss(dec!(1)));
        }

        assert_eq!(m.rounds_remaining(), 0);
        assert_eq!(m.current_bet_amount(), Decimal::MAX);
        assert_eq!(m.total_lost(), dec!(200));
    }

    #[test]
    fn test_totals_saturate() {
        let mut m = started(AutoBetSettings::new(dec!(10), 5));
        m.process_round_result(&RoundResult::win(Decimal::MAX));
        m.process_round_result(&RoundResult::win(Decimal::MAX));
        assert_eq!(m.total_won(), Decimal::MAX);
        assert_eq!(m.rounds_remaining(), 3);
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: AutoBetSettings = toml::from_str(
            r#"
            amount = 10.0
            rounds = 3
            reset_after_win = true
            auto_cashout = 1.8
            "#,
        )
        .unwrap();
        assert_eq!(settings.amount, dec!(10));
        assert_eq!(settings.rounds, 3);
        assert!(settings.reset_after_win);
        assert_eq!(settings.auto_cashout, Some(1.8));
        assert!(settings.stop_on_win.is_none());
    }
}
