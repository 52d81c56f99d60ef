//! Seasonal event calendar.
//!
//! Windows are fixed month/day ranges anchored to the year of the date being
//! checked. A window whose end falls before its start wraps over New Year.
//! Dates come from the local calendar with no timezone normalization.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

use super::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonalEvent {
    pub name: &'static str,
    pub theme: Theme,
    /// (month, day), inclusive.
    pub start: (u32, u32),
    /// (month, day), inclusive.
    pub end: (u32, u32),
}

/// Checked in order; the first active event wins when windows overlap.
pub const SEASONAL_EVENTS: &[SeasonalEvent] = &[
    SeasonalEvent {
        name: "Carnaval",
        theme: Theme::Carnival,
        start: (2, 10),
        end: (3, 5),
    },
    SeasonalEvent {
        name: "Festa Junina",
        theme: Theme::FestaJunina,
        start: (6, 1),
        end: (6, 30),
    },
    SeasonalEvent {
        name: "Halloween",
        theme: Theme::Halloween,
        start: (10, 25),
        end: (10, 31),
    },
    SeasonalEvent {
        name: "Natal",
        theme: Theme::Christmas,
        start: (12, 1),
        end: (12, 25),
    },
    SeasonalEvent {
        name: "Réveillon",
        theme: Theme::NewYear,
        start: (12, 26),
        end: (1, 6),
    },
];

impl SeasonalEvent {
    pub fn wraps_year(&self) -> bool {
        self.end < self.start
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let year = date.year();
        let Some(start) = NaiveDate::from_ymd_opt(year, self.start.0, self.start.1) else {
            return false;
        };
        let Some(end) = NaiveDate::from_ymd_opt(year, self.end.0, self.end.1) else {
            return false;
        };
        if self.wraps_year() {
            date >= start || date <= end
        } else {
            date >= start && date <= end
        }
    }
}

/// The first event whose window contains `date`.
pub fn active_event(date: NaiveDate) -> Option<&'static SeasonalEvent> {
    SEASONAL_EVENTS.iter().find(|e| e.is_active_on(date))
}

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
