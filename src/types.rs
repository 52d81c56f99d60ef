//! Shared types for the din-din game.
//!
//! These types form the data model used across the autobet, bonus, queue
//! and game modules so that none of them depend on each other directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Round result
// ---------------------------------------------------------------------------

/// Outcome of a single settled bet, as fed to the auto-bet manager.
///
/// `amount` is the profit on a win and the stake lost on a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub won: bool,
    pub amount: Decimal,
}

impl RoundResult {
    pub fn win(profit: Decimal) -> Self {
        Self { won: true, amount: profit }
    }

    pub fn loss(stake: Decimal) -> Self {
        Self { won: false, amount: stake }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.won {
            write!(f, "WIN +{}", self.amount)
        } else {
            write!(f, "LOSS -{}", self.amount)
        }
    }
}

// ---------------------------------------------------------------------------
// Round phase
// ---------------------------------------------------------------------------

/// One timed cycle of the game: betting → running → ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    Betting,
    Running,
    Ended,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Betting => write!(f, "BETTING"),
            RoundPhase::Running => write!(f, "RUNNING"),
            RoundPhase::Ended => write!(f, "ENDED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for din-din.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    #[error("Round {round} is not accepting bets (phase {phase})")]
    BettingClosed { round: u64, phase: RoundPhase },

    #[error("Game is under maintenance")]
    Maintenance,

    #[error("Auto-bet service is no longer running")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_result_constructors() {
        let w = RoundResult::win(dec!(12.5));
        assert!(w.won);
        assert_eq!(w.amount, dec!(12.5));

        let l = RoundResult::loss(dec!(10));
        assert!(!l.won);
        assert_eq!(l.amount, dec!(10));
    }

    #[test]
    fn test_round_result_display() {
        assert_eq!(format!("{}", RoundResult::win(dec!(5))), "WIN +5");
        assert_eq!(format!("{}", RoundResult::loss(dec!(3))), "LOSS -3");
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", RoundPhase::Betting), "BETTING");
        assert_eq!(format!("{}", RoundPhase::Ended), "ENDED");
    }

    #[test]
    fn test_error_messages() {
        let e = GameError::InsufficientBalance {
            needed: dec!(10),
            available: dec!(4),
        };
        assert_eq!(e.to_string(), "Insufficient balance: need 10, have 4");

        let e = GameError::BettingClosed {
            round: 7,
            phase: RoundPhase::Running,
        };
        assert!(e.to_string().contains("Round 7"));
        assert!(e.to_string().contains("RUNNING"));
    }
}
