//! Game loop: betting → running → ended, one round at a time.
//!
//! Each round draws a crash point, lets the auto-bet manager place a stake,
//! advances the multiplier in fixed ticks (drawing a bonus along the way),
//! cashes out when the auto-bet rule says so, then settles and reports.

pub mod round;
pub mod session;

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::autobet::handle::AutoBetHandle;
use crate::bonus::{seasonal, BonusSelector};
use crate::config::GameConfig;
use crate::maintenance::MaintenanceStore;
use crate::notify::{self, Mailer, OutgoingEmail};
use crate::queue::TaskQueue;
use crate::types::{GameError, RoundPhase, RoundResult};
use round::{crash_point, Round};
use session::PlayerSession;

/// Priority for congratulation emails on the task queue.
const BIG_WIN_EMAIL_PRIORITY: i32 = 10;

// ---------------------------------------------------------------------------
// Round report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: u64,
    pub crash_point: f64,
    pub stake: Option<Decimal>,
    /// Base multiplier at cash-out, before any bonus.
    pub cashed_out_at: Option<f64>,
    /// Bonus-adjusted multiplier actually paid.
    pub payout_multiplier: Option<f64>,
    pub payout: Decimal,
    pub bonus: Option<String>,
    pub result: Option<RoundResult>,
    pub balance_after: Decimal,
    /// Simulated running time of the round.
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Where big-win emails go.
pub struct Notifications {
    pub queue: TaskQueue<()>,
    pub mailer: Arc<dyn Mailer>,
    pub threshold: Decimal,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

pub struct GameLoop {
    config: GameConfig,
    rng: StdRng,
    selector: BonusSelector,
    autobet: AutoBetHandle,
    session: PlayerSession,
    notifications: Option<Notifications>,
    maintenance: Option<Arc<MaintenanceStore>>,
    /// Calendar date for bonus draws; the local date when unset.
    date: Option<NaiveDate>,
    round_number: u64,
}

impl GameLoop {
    pub fn new(config: GameConfig, autobet: AutoBetHandle, selector: BonusSelector) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let session = PlayerSession::new(
            config.player_name.clone(),
            config.player_email.clone(),
            config.initial_balance,
        );
        Self {
            config,
            rng,
            selector,
            autobet,
            session,
            notifications: None,
            maintenance: None,
            date: None,
            round_number: 0,
        }
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Refuse to play while the store says the game is under maintenance.
    pub fn with_maintenance(mut self, store: Arc<MaintenanceStore>) -> Self {
        self.maintenance = Some(store);
        self
    }

    /// Draw bonuses as if today were `date`.
    pub fn with_calendar_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn autobet(&self) -> &AutoBetHandle {
        &self.autobet
    }

    /// Play one full round and settle it.
    ///
    /// Fails with [`GameError::Maintenance`] without touching any state while
    /// maintenance mode is on.
    pub async fn play_round(&mut self) -> Result<RoundReport, GameError> {
        if let Some(store) = &self.maintenance {
            if store.is_enabled().await {
                return Err(GameError::Maintenance);
            }
        }

        self.round_number += 1;
        let crash = crash_point(self.rng.random::<f64>(), self.config.house_edge);
        let mut round = Round::new(self.round_number, crash);
        let date = self.date.unwrap_or_else(seasonal::today);

        // -- Betting -----------------------------------------------------
        round.accepts_bets()?;
        let stake = self.place_auto_bet().await?;

        // -- Running -----------------------------------------------------
        round.begin();
        let tick = Duration::from_millis(self.config.tick_ms);
        let max = Duration::from_secs(self.config.max_round_secs);
        let bonus_every = self.config.bonus_check_every_ticks.max(1);
        let mut ticks: u32 = 0;
        let mut cash_out: Option<(f64, f64)> = None;

        while round.phase() == RoundPhase::Running {
            let m = round.advance(tick, self.config.growth_rate, max);
            if round.has_crashed() {
                break;
            }
            ticks = ticks.wrapping_add(1);

            if !round.has_had_bonus() && ticks % bonus_every == 0 {
                if let Some(bonus) = self.selector.select_on(round.number, m, date) {
                    round.apply_bonus(bonus);
                }
            }

            // Checked even on the tick that hits the time limit.
            if stake.is_some() && self.autobet.should_cash_out(m).await? {
                cash_out = Some((m, round.payout_multiplier()));
                break;
            }
        }
        // -- Ended -------------------------------------------------------
        let (result, payout) = match stake {
            Some(stake) => self.settle(stake, cash_out),
            None => (None, Decimal::ZERO),
        };
        if let Some(result) = result {
            self.autobet.process_round_result(result).await?;
        }

        if let Some((_, paid)) = cash_out {
            self.maybe_notify(payout, paid);
        }

        let report = RoundReport {
            round: round.number,
            crash_point: crash,
            stake,
            cashed_out_at: cash_out.map(|(base, _)| base),
            payout_multiplier: cash_out.map(|(_, paid)| paid),
            payout,
            bonus: round.bonus().map(|b| b.bonus.id.to_string()),
            result,
            balance_after: self.session.balance(),
            duration_secs: round.elapsed().as_secs_f64(),
            timestamp: Utc::now(),
        };

        info!(
            round = report.round,
            crash = format!("{:.2}x", report.crash_point),
            stake = ?report.stake,
            cashed_out = ?report.cashed_out_at.map(|m| format!("{m:.2}x")),
            bonus = ?report.bonus,
            balance = %report.balance_after,
            "Round ended"
        );

        Ok(report)
    }

    /// Place the auto-bet stake if the manager wants one and funds allow.
    async fn place_auto_bet(&mut self) -> Result<Option<Decimal>, GameError> {
        if !self.autobet.should_continue_betting().await? {
            return Ok(None);
        }
        let amount = self.autobet.current_bet_amount().await?;
        match self.session.place_bet(amount) {
            Ok(()) => Ok(Some(amount)),
            Err(e @ GameError::InsufficientBalance { .. }) => {
                warn!(round = self.round_number, error = %e, "Stopping auto-bet");
                self.autobet.stop().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn settle(&mut self, stake: Decimal, cash_out: Option<(f64, f64)>) -> (Option<RoundResult>, Decimal) {
        match cash_out {
            Some((_, paid)) => {
                let factor = Decimal::from_f64(paid).unwrap_or(Decimal::ONE);
                let payout = (stake * factor).round_dp(2);
                self.session.credit(payout);
                (Some(RoundResult::win(payout - stake)), payout)
            }
            None => (Some(RoundResult::loss(stake)), Decimal::ZERO),
        }
    }

    fn maybe_notify(&self, payout: Decimal, multiplier: f64) {
        let Some(n) = &self.notifications else { return };
        if payout < n.threshold {
            return;
        }
        let email = OutgoingEmail::big_win(&self.session.email, self.round_number, payout, multiplier);
        let id = notify::enqueue_email(&n.queue, Arc::clone(&n.mailer), email, BIG_WIN_EMAIL_PRIORITY);
        debug!(task_id = %id, %payout, "Big-win email queued");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
