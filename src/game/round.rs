//! Single-round engine: crash point, multiplier curve, phase transitions and
//! the bonus attached to the round.

use serde::Serialize;
use std::time::Duration;

use crate::bonus::BonusMultiplier;
use crate::types::{GameError, RoundPhase};

/// `max(1.00, floor(100 * (1 - edge) / (1 - u)) / 100)` for `u` in [0, 1).
pub fn crash_point(u: f64, house_edge: f64) -> f64 {
    let u = u.clamp(0.0, 1.0 - f64::EPSILON);
    let raw = (100.0 * (1.0 - house_edge) / (1.0 - u)).floor() / 100.0;
    raw.max(1.0)
}

/// Multiplier after `elapsed` running time.
pub fn multiplier_at(elapsed: Duration, growth_rate: f64) -> f64 {
    (growth_rate * elapsed.as_secs_f64()).exp()
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveBonus {
    pub bonus: BonusMultiplier,
    /// Round time at which the bonus fired.
    #[serde(skip)]
    pub started_at: Duration,
}

impl ActiveBonus {
    pub fn is_live(&self, elapsed: Duration) -> bool {
        elapsed < self.started_at + self.bonus.duration
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    pub number: u64,
    pub crash_point: f64,
    phase: RoundPhase,
    elapsed: Duration,
    multiplier: f64,
    crashed: bool,
    bonus: Option<ActiveBonus>,
}

impl Round {
    pub fn new(number: u64, crash_point: f64) -> Self {
        Self {
            number,
            crash_point,
            phase: RoundPhase::Betting,
            elapsed: Duration::ZERO,
            multiplier: 1.0,
            crashed: false,
            bonus: None,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True once the multiplier has reached the crash point.
    pub fn has_crashed(&self) -> bool {
        self.crashed
    }

    pub fn accepts_bets(&self) -> Result<(), GameError> {
        match self.phase {
            RoundPhase::Betting => Ok(()),
            phase => Err(GameError::BettingClosed {
                round: self.number,
                phase,
            }),
        }
    }

    /// Close betting and start the multiplier.
    pub fn begin(&mut self) {
        if self.phase == RoundPhase::Betting {
            self.phase = RoundPhase::Running;
        }
    }

    /// Move the clock forward and return the new multiplier. The round ends
    /// when the multiplier reaches the crash point or `max_duration` passes.
    pub fn advance(&mut self, dt: Duration, growth_rate: f64, max_duration: Duration) -> f64 {
        if self.phase != RoundPhase::Running {
            return self.multiplier;
        }
        self.elapsed += dt;
        let m = multiplier_at(self.elapsed, growth_rate);
        if m >= self.crash_point {
            self.multiplier = self.crash_point;
            self.crashed = true;
            self.phase = RoundPhase::Ended;
        } else {
            self.multiplier = m;
            if self.elapsed >= max_duration {
                self.phase = RoundPhase::Ended;
            }
        }
        self.multiplier
    }

    /// Attach a bonus. At most one per round, only while running.
    pub fn apply_bonus(&mut self, bonus: BonusMultiplier) -> bool {
        if self.phase != RoundPhase::Running || self.bonus.is_some() {
            return false;
        }
        self.bonus = Some(ActiveBonus {
            bonus,
            started_at: self.elapsed,
        });
        true
    }

    pub fn has_had_bonus(&self) -> bool {
        self.bonus.is_some()
    }

    pub fn bonus(&self) -> Option<&ActiveBonus> {
        self.bonus.as_ref()
    }

    pub fn live_bonus(&self) -> Option<&BonusMultiplier> {
        self.bonus
            .as_ref()
            .filter(|b| b.is_live(self.elapsed))
            .map(|b| &b.bonus)
    }

    /// Multiplier a cash-out right now would pay, including a live bonus.
    pub fn payout_multiplier(&self) -> f64 {
        self.multiplier * self.live_bonus().map_or(1.0, |b| b.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
