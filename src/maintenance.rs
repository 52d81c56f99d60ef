//! Maintenance-mode flag.
//!
//! Held in memory behind an async lock and written through to a small JSON
//! file on every change, so a restart comes back in the same mode.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::GameError;

/// Cookie the dashboard mirrors the flag into.
pub const MAINTENANCE_COOKIE: &str = "maintenance";

/// Default state file path.
pub const DEFAULT_STATE_FILE: &str = "maintenance.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceState {
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for MaintenanceState {
    fn default() -> Self {
        Self {
            enabled: false,
            message: None,
            updated_at: Utc::now(),
        }
    }
}

impl MaintenanceState {
    pub fn enabled(message: Option<String>) -> Self {
        Self {
            enabled: true,
            message,
            updated_at: Utc::now(),
        }
    }

    /// `Set-Cookie` value mirroring this state.
    pub fn cookie(&self) -> String {
        let v = if self.enabled { 1 } else { 0 };
        format!("{MAINTENANCE_COOKIE}={v}; Path=/; SameSite=Lax")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_string()
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

pub struct MaintenanceStore {
    path: String,
    state: RwLock<MaintenanceState>,
}

impl MaintenanceStore {
    /// Restore from disk; a missing or unreadable file means "not in maintenance".
    pub fn open(path: impl Into<String>) -> Self {
        let path = path.into();
        let state = match read_state(&path) {
            Ok(Some(s)) => s,
            Ok(None) => {
                info!(path = %path, "No maintenance state found, assuming disabled");
                MaintenanceState::default()
            }
            Err(e) => {
                warn!(path = %path, error = format!("{e:#}"), "Unreadable maintenance state, assuming disabled");
                MaintenanceState::default()
            }
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub async fn current(&self) -> MaintenanceState {
        self.state.read().await.clone()
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.read().await.enabled
    }

    /// Change the flag and persist it. The in-memory value is kept even if
    /// the write fails; the error is returned to the caller.
    pub async fn set(
        &self,
        enabled: bool,
        message: Option<String>,
    ) -> Result<MaintenanceState, GameError> {
        let mut state = self.state.write().await;
        *state = MaintenanceState {
            enabled,
            message,
            updated_at: Utc::now(),
        };
        info!(enabled, message = ?state.message, "Maintenance mode updated");
        write_state(&state, &self.path).map_err(|e| GameError::Storage(format!("{e:#}")))?;
        Ok(state.clone())
    }
}

/// `None` if the file doesn't exist.
fn read_state(path: &str) -> Result<Option<MaintenanceState>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state from {path}"))?;
    let state: MaintenanceState = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse state from {path}"))?;
    info!(path, enabled = state.enabled, message = ?state.message, "Maintenance state loaded from disk");
    Ok(Some(state))
}

fn write_state(state: &MaintenanceState, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(state)
        .context("Failed to serialise maintenance state")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write state to {path}"))?;
    debug!(path, enabled = state.enabled, "Maintenance state saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("dindin_test_store_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_cookie_mirror() {
        assert!(MaintenanceState::default().cookie().starts_with("maintenance=0"));
        assert!(MaintenanceState::enabled(None).cookie().starts_with("maintenance=1"));
    }

    #[tokio::test]
    async fn test_store_persists_across_reopen() {
        let path = temp_path();
        let store = MaintenanceStore::open(path.clone());
        assert!(!store.is_enabled().await);

        store.set(true, Some("Deploy em andamento".into())).await.unwrap();
        assert!(store.is_enabled().await);

        let reopened = MaintenanceStore::open(path.clone());
        let state = reopened.current().await;
        assert!(state.enabled);
        assert_eq!(state.message.as_deref(), Some("Deploy em andamento"));

        assert_eq!(read_state(&path).unwrap(), Some(state));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_disabled() {
        let path = temp_path();
        assert!(read_state(&path).unwrap().is_none());
        let store = MaintenanceStore::open(path.clone());
        assert!(!tokio_test::block_on(store.is_enabled()));
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_disabled() {
        let path = temp_path();
        std::fs::write(&path, "garbage").unwrap();
        assert!(read_state(&path).is_err());
        let store = MaintenanceStore::open(path.clone());
        assert!(!tokio_test::block_on(store.is_enabled()));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_path_is_a_storage_error() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("dindin_missing_dir_{}", uuid::Uuid::new_v4()));
        dir.push("maintenance.json");
        let store = MaintenanceStore::open(dir.to_string_lossy().to_string());

        let err = store.set(true, None).await.unwrap_err();
        assert!(matches!(err, GameError::Storage(_)));
        assert!(store.is_enabled().await, "in-memory flag still flips");
    }

    #[test]
    fn test_state_deserializes_without_message() {
        let json = r#"{"enabled":true,"updated_at":"2026-10-01T12:00:00Z"}"#;
        let state: MaintenanceState = serde_json::from_str(json).unwrap();
        assert!(state.enabled);
        assert!(state.message.is_none());
    }
}
