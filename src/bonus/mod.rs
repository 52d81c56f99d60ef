//! Bonus multipliers: static catalog, seasonal events, and per-round selection.

pub mod seasonal;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use seasonal::{SeasonalEvent, SEASONAL_EVENTS};
pub use selector::BonusSelector;

/// Id of the bonus that only runs on Saturdays and Sundays.
pub const WEEKEND_BONUS_ID: &str = "weekend-bonus";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusType {
    Standard,
    Jackpot,
    Holiday,
    Special,
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusType::Standard => write!(f, "standard"),
            BonusType::Jackpot => write!(f, "jackpot"),
            BonusType::Holiday => write!(f, "holiday"),
            BonusType::Special => write!(f, "special"),
        }
    }
}

/// Visual theme, shared by bonuses and seasonal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Classic,
    Gold,
    Carnival,
    FestaJunina,
    Halloween,
    Christmas,
    NewYear,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Classic => write!(f, "classic"),
            Theme::Gold => write!(f, "gold"),
            Theme::Carnival => write!(f, "carnival"),
            Theme::FestaJunina => write!(f, "festa-junina"),
            Theme::Halloween => write!(f, "halloween"),
            Theme::Christmas => write!(f, "christmas"),
            Theme::NewYear => write!(f, "new-year"),
        }
    }
}

/// A catalog entry. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusMultiplier {
    pub id: &'static str,
    pub name: &'static str,
    pub bonus_type: BonusType,
    /// Payout multiplier applied while the bonus is live.
    pub value: f64,
    pub theme: Theme,
    /// Probability (0.0–1.0) of activating when otherwise eligible.
    pub chance: f64,
    /// How long the bonus stays live once drawn.
    #[serde(serialize_with = "duration_secs::serialize")]
    pub duration: Duration,
    /// First round number where the bonus may appear.
    pub min_round: u64,
    /// The bonus may only appear while the multiplier is at or below this.
    pub max_multiplier: f64,
    pub active: bool,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub const BONUS_CATALOG: &[BonusMultiplier] = &[
    BonusMultiplier {
        id: "standard-2x",
        name: "Double Up",
        bonus_type: BonusType::Standard,
        value: 2.0,
        theme: Theme::Classic,
        chance: 0.15,
        duration: Duration::from_secs(5),
        min_round: 0,
        max_multiplier: 3.0,
        active: true,
    },
    BonusMultiplier {
        id: "standard-3x",
        name: "Triple Threat",
        bonus_type: BonusType::Standard,
        value: 3.0,
        theme: Theme::Classic,
        chance: 0.08,
        duration: Duration::from_secs(4),
        min_round: 3,
        max_multiplier: 2.0,
        active: true,
    },
    BonusMultiplier {
        id: "jackpot-bonus",
        name: "Jackpot",
        bonus_type: BonusType::Jackpot,
        value: 10.0,
        theme: Theme::Gold,
        chance: 0.05,
        duration: Duration::from_secs(3),
        min_round: 10,
        max_multiplier: 1.5,
        active: true,
    },
    BonusMultiplier {
        id: "carnival-bonus",
        name: "Carnaval",
        bonus_type: BonusType::Holiday,
        value: 2.5,
        theme: Theme::Carnival,
        chance: 0.20,
        duration: Duration::from_secs(6),
        min_round: 0,
        max_multiplier: 5.0,
        active: true,
    },
    BonusMultiplier {
        id: "festa-junina-bonus",
        name: "Festa Junina",
        bonus_type: BonusType::Holiday,
        value: 2.0,
        theme: Theme::FestaJunina,
        chance: 0.20,
        duration: Duration::from_secs(6),
        min_round: 0,
        max_multiplier: 5.0,
        active: true,
    },
    BonusMultiplier {
        id: "halloween-bonus",
        name: "Halloween",
        bonus_type: BonusType::Holiday,
        value: 3.0,
        theme: Theme::Halloween,
        chance: 0.15,
        duration: Duration::from_secs(5),
        min_round: 0,
        max_multiplier: 4.0,
        active: true,
    },
    BonusMultiplier {
        id: "christmas-bonus",
        name: "Natal",
        bonus_type: BonusType::Holiday,
        value: 2.5,
        theme: Theme::Christmas,
        chance: 0.20,
        duration: Duration::from_secs(6),
        min_round: 0,
        max_multiplier: 5.0,
        active: true,
    },
    BonusMultiplier {
        id: "new-year-bonus",
        name: "Réveillon",
        bonus_type: BonusType::Holiday,
        value: 3.0,
        theme: Theme::NewYear,
        chance: 0.20,
        duration: Duration::from_secs(6),
        min_round: 0,
        max_multiplier: 5.0,
        active: true,
    },
    BonusMultiplier {
        id: WEEKEND_BONUS_ID,
        name: "Weekend Boost",
        bonus_type: BonusType::Special,
        value: 1.5,
        theme: Theme::Classic,
        chance: 0.10,
        duration: Duration::from_secs(8),
        min_round: 0,
        max_multiplier: 10.0,
        active: true,
    },
    BonusMultiplier {
        id: "mega-jackpot",
        name: "Mega Jackpot",
        bonus_type: BonusType::Jackpot,
        value: 50.0,
        theme: Theme::Gold,
        chance: 0.01,
        duration: Duration::from_secs(2),
        min_round: 50,
        max_multiplier: 1.2,
        active: false,
    },
];

/// Look up a catalog entry by id.
pub fn find(catalog: &[BonusMultiplier], id: &str) -> Option<BonusMultiplier> {
    catalog.iter().find(|b| b.id == id).cloned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
