//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::autobet::AutoBetSnapshot;
use crate::bonus::{seasonal, BonusMultiplier, SeasonalEvent, BONUS_CATALOG};
use crate::game::RoundReport;
use crate::maintenance::{MaintenanceState, MaintenanceStore};
use crate::queue::{QueueStats, TaskQueue};
use crate::ratelimit::RateLimiter;

/// Rounds kept for `/api/rounds`.
const ROUND_HISTORY: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub game_name: String,
    pub started_at: DateTime<Utc>,
    pub balance: RwLock<Decimal>,
    pub rounds: RwLock<Vec<RoundReport>>,
    pub autobet: RwLock<Option<AutoBetSnapshot>>,
    pub maintenance: Arc<MaintenanceStore>,
    pub rate_limiter: RateLimiter,
    pub queue: Option<TaskQueue<()>>,
}

impl DashboardState {
    pub fn new(
        game_name: impl Into<String>,
        initial_balance: Decimal,
        maintenance: Arc<MaintenanceStore>,
        rate_limiter: RateLimiter,
        queue: Option<TaskQueue<()>>,
    ) -> Self {
        Self {
            game_name: game_name.into(),
            started_at: Utc::now(),
            balance: RwLock::new(initial_balance),
            rounds: RwLock::new(Vec::new()),
            autobet: RwLock::new(None),
            maintenance,
            rate_limiter,
            queue,
        }
    }

    /// Record a finished round for the API.
    pub async fn record_round(&self, report: RoundReport, autobet: Option<AutoBetSnapshot>) {
        *self.balance.write().await = report.balance_after;
        if autobet.is_some() {
            *self.autobet.write().await = autobet;
        }
        let mut rounds = self.rounds.write().await;
        rounds.push(report);
        let excess = rounds.len().saturating_sub(ROUND_HISTORY);
        rounds.drain(..excess);
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub game: String,
    pub balance: Decimal,
    pub rounds_played: u64,
    pub last_crash_point: Option<f64>,
    pub autobet: Option<AutoBetSnapshot>,
    pub queue: Option<QueueStats>,
    pub maintenance: bool,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BonusesResponse {
    pub date: NaiveDate,
    pub event: Option<SeasonalEvent>,
    pub catalog: &'static [BonusMultiplier],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceRequest {
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let rounds = state.rounds.read().await;
    Json(StatusResponse {
        game: state.game_name.clone(),
        balance: *state.balance.read().await,
        rounds_played: rounds.last().map_or(0, |r| r.round),
        last_crash_point: rounds.last().map(|r| r.crash_point),
        autobet: state.autobet.read().await.clone(),
        queue: state.queue.as_ref().map(|q| q.stats()),
        maintenance: state.maintenance.is_enabled().await,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/rounds
pub async fn get_rounds(State(state): State<AppState>) -> Json<Vec<RoundReport>> {
    Json(state.rounds.read().await.clone())
}

/// GET /api/bonuses
pub async fn get_bonuses() -> Json<BonusesResponse> {
    let date = seasonal::today();
    Json(BonusesResponse {
        date,
        event: seasonal::active_event(date).copied(),
        catalog: BONUS_CATALOG,
    })
}

/// GET /api/maintenance
pub async fn get_maintenance(State(state): State<AppState>) -> Response {
    let current = state.maintenance.current().await;
    with_cookie(&current, Json(current.clone()).into_response())
}

/// POST /api/maintenance
pub async fn set_maintenance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MaintenanceRequest>,
) -> Response {
    let key = client_key(&headers);
    let decision = state.rate_limiter.check(&key, Instant::now());
    if !decision.allowed {
        warn!(client = %key, "Maintenance toggle rate-limited");
        let retry = decision.reset_after.as_secs().max(1).to_string();
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry)],
        )
            .into_response();
    }

    match state.maintenance.set(req.enabled, req.message).await {
        Ok(updated) => with_cookie(&updated, Json(updated.clone()).into_response()),
        Err(e) => {
            error!(error = %e, "Failed to persist maintenance state");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

fn with_cookie(state: &MaintenanceState, mut resp: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&state.cookie()) {
        resp.headers_mut().insert(header::SET_COOKIE, value);
    }
    resp
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
