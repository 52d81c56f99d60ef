//! Player balance and running totals for one session.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::types::GameError;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSession {
    pub player: String,
    pub email: String,
    balance: Decimal,
    total_wagered: Decimal,
    total_paid_out: Decimal,
    bets_placed: u64,
    bets_won: u64,
}

impl PlayerSession {
    pub fn new(player: impl Into<String>, email: impl Into<String>, balance: Decimal) -> Self {
        Self {
            player: player.into(),
            email: email.into(),
            balance: balance.max(Decimal::ZERO),
            total_wagered: Decimal::ZERO,
            total_paid_out: Decimal::ZERO,
            bets_placed: 0,
            bets_won: 0,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn total_wagered(&self) -> Decimal {
        self.total_wagered
    }

    pub fn total_paid_out(&self) -> Decimal {
        self.total_paid_out
    }

    pub fn bets_placed(&self) -> u64 {
        self.bets_placed
    }

    pub fn bets_won(&self) -> u64 {
        self.bets_won
    }

    /// Net result of the session so far.
    pub fn net(&self) -> Decimal {
        self.total_paid_out - self.total_wagered
    }

    /// Debit a stake.
    pub fn place_bet(&mut self, amount: Decimal) -> Result<(), GameError> {
        if amount <= Decimal::ZERO {
            return Err(GameError::InvalidBet(format!("stake must be positive, got {amount}")));
        }
        if amount > self.balance {
            return Err(GameError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.total_wagered += amount;
        self.bets_placed += 1;
        debug!(player = %self.player, %amount, balance = %self.balance, "Bet placed");
        Ok(())
    }

    /// Credit a cash-out payout.
    pub fn credit(&mut self, payout: Decimal) {
        if payout <= Decimal::ZERO {
            return;
        }
        self.balance += payout;
        self.total_paid_out += payout;
        self.bets_won += 1;
        debug!(player = %self.player, %payout, balance = %self.balance, "Payout credited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bet_and_credit() {
        let mut s = PlayerSession::new("ana", "ana@example.com", dec!(100));
        s.place_bet(dec!(30)).unwrap();
        assert_eq!(s.balance(), dec!(70));

        s.credit(dec!(60));
        assert_eq!(s.balance(), dec!(130));
        assert_eq!(s.net(), dec!(30));
        assert_eq!(s.bets_placed(), 1);
        assert_eq!(s.bets_won(), 1);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut s = PlayerSession::new("ana", "ana@example.com", dec!(5));
        let err = s.place_bet(dec!(10)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientBalance { .. }));
        assert_eq!(s.balance(), dec!(5));
    }

    #[test]
    fn test_rejects_non_positive_stake() {
        let mut s = PlayerSession::new("ana", "ana@example.com", dec!(5));
        assert!(matches!(s.place_bet(Decimal::ZERO), Err(GameError::InvalidBet(_))));
        assert!(matches!(s.place_bet(dec!(-1)), Err(GameError::InvalidBet(_))));
    }

    #[test]
    fn test_negative_opening_balance_clamped() {
        let s = PlayerSession::new("x", "x@y.z", dec!(-50));
        assert_eq!(s.balance(), Decimal::ZERO);
    }
}
