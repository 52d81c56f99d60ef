//! Fixed-window rate limiter keyed by client identifier.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Tracked keys before `check` sweeps out expired windows.
const DEFAULT_MAX_TRACKED: usize = 10_000;

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_tracked: usize,
    store: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            max_tracked: DEFAULT_MAX_TRACKED,
            store: Mutex::new(HashMap::new()),
        }
    }

    /// Sweep expired windows whenever more than `max_tracked` keys are held.
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked.max(1);
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `key` at `now`.
    pub fn check(&self, key: &str, now: Instant) -> RateDecision {
        let mut store = self.store.lock().unwrap_or_else(|p| p.into_inner());
        if store.len() >= self.max_tracked && !store.contains_key(key) {
            let before = store.len();
            store.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
            debug!(removed = before - store.len(), "Swept expired rate-limit windows");
        }
        let window = store.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            window.started = now;
            window.count = 0;
        }

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count >= self.max_requests {
            debug!(key, count = window.count, "Rate limit exceeded");
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateDecision {
            allowed: true,
            remaining: self.max_requests - window.count,
            reset_after,
        }
    }

    /// Drop windows that have fully expired. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut store = self.store.lock().unwrap_or_else(|p| p.into_inner());
        let before = store.len();
        store.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before - store.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
