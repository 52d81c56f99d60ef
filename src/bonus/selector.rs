//! Per-round bonus selection.
//!
//! Filters the catalog by activity, round gate, multiplier gate, seasonal
//! theme, weekday and a random draw against each bonus's chance, then picks
//! one eligible bonus uniformly (preferring the live seasonal theme).

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::seasonal::{self, SeasonalEvent};
use super::{BonusMultiplier, BonusType, BONUS_CATALOG, WEEKEND_BONUS_ID};

pub struct BonusSelector {
    catalog: Vec<BonusMultiplier>,
    rng: StdRng,
}

impl BonusSelector {
    pub fn new(catalog: Vec<BonusMultiplier>) -> Self {
        Self {
            catalog,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic draws, for simulations and tests.
    pub fn with_seed(catalog: Vec<BonusMultiplier>, seed: u64) -> Self {
        Self {
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Selector over the built-in catalog.
    pub fn standard(seed: Option<u64>) -> Self {
        let catalog = BONUS_CATALOG.to_vec();
        match seed {
            Some(s) => Self::with_seed(catalog, s),
            None => Self::new(catalog),
        }
    }

    pub fn catalog(&self) -> &[BonusMultiplier] {
        &self.catalog
    }

    /// Draw a bonus for a round on the given calendar date.
    pub fn select_on(
        &mut self,
        current_round: u64,
        current_multiplier: f64,
        date: NaiveDate,
    ) -> Option<BonusMultiplier> {
        let event = seasonal::active_event(date);
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);

        let mut eligible: Vec<&BonusMultiplier> = Vec::new();
        for bonus in &self.catalog {
            if !passes_gates(bonus, current_round, current_multiplier, event, weekend) {
                continue;
            }
            if self.rng.random::<f64>() < bonus.chance {
                eligible.push(bonus);
            }
        }

        if eligible.is_empty() {
            debug!(round = current_round, multiplier = current_multiplier, "No bonus this draw");
            return None;
        }

        let themed: Vec<&BonusMultiplier> = match event {
            Some(ev) => eligible.iter().copied().filter(|b| b.theme == ev.theme).collect(),
            None => Vec::new(),
        };
        let pool = if themed.is_empty() { &eligible } else { &themed };

        let picked = pool[self.rng.random_range(0..pool.len())].clone();
        info!(
            round = current_round,
            bonus = picked.id,
            value = picked.value,
            event = event.map(|e| e.name),
            candidates = eligible.len(),
            "Bonus selected"
        );
        Some(picked)
    }
}

/// Every deterministic gate; the random draw happens separately.
fn passes_gates(
    bonus: &BonusMultiplier,
    current_round: u64,
    current_multiplier: f64,
    event: Option<&SeasonalEvent>,
    weekend: bool,
) -> bool {
    if !bonus.active
        || current_round < bonus.min_round
        || current_multiplier > bonus.max_multiplier
    {
        return false;
    }
    if bonus.bonus_type == BonusType::Holiday && event.map(|e| e.theme) != Some(bonus.theme) {
        return false;
    }
    if bonus.id == WEEKEND_BONUS_ID && !weekend {
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
