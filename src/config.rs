//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Tables that are optional fall back to their `Default` values.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

use crate::autobet::AutoBetSettings;
use crate::maintenance::MaintenanceConfig;
use crate::queue::QueueConfig;
use crate::ratelimit::RateLimitConfig;
use crate::types::GameError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub game: GameConfig,
    pub auto_bet: AutoBetSettings,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub name: String,
    /// Wall-clock pause between rounds.
    pub round_interval_secs: u64,
    /// Simulated time step inside a running round.
    pub tick_ms: u64,
    /// Fraction kept by the house (0.03 = 3%).
    pub house_edge: f64,
    /// Multiplier growth per second: m(t) = e^(growth_rate * t).
    pub growth_rate: f64,
    /// A round that has not crashed by then ends anyway.
    pub max_round_secs: u64,
    pub initial_balance: Decimal,
    /// Ticks between bonus draws while no bonus has fired this round.
    pub bonus_check_every_ticks: u32,
    pub player_name: String,
    pub player_email: String,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "din-din".to_string(),
            round_interval_secs: 5,
            tick_ms: 100,
            house_edge: 0.03,
            growth_rate: 0.06,
            max_round_secs: 60,
            initial_balance: dec!(1000),
            bonus_check_every_ticks: 10,
            player_name: "guest".to_string(),
            player_email: "guest@dindin.local".to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsConfig {
    pub enabled: bool,
    /// Payouts at or above this amount trigger a congratulation email.
    pub big_win_threshold: Decimal,
    /// Simulated delivery latency.
    pub mailer_latency_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            big_win_threshold: dec!(100),
            mailer_latency_ms: 250,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GameError> {
        if !(0.0..1.0).contains(&self.game.house_edge) {
            return Err(GameError::Config(format!(
                "game.house_edge must be in [0, 1), got {}",
                self.game.house_edge
            )));
        }
        if self.game.tick_ms == 0 {
            return Err(GameError::Config("game.tick_ms must be positive".into()));
        }
        if self.game.growth_rate <= 0.0 {
            return Err(GameError::Config("game.growth_rate must be positive".into()));
        }
        if self.game.bonus_check_every_ticks == 0 {
            return Err(GameError::Config(
                "game.bonus_check_every_ticks must be positive".into(),
            ));
        }
        Ok(())
    }
}
