//! DIN-DIN: Round-based multiplier game with auto-betting
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the maintenance switch from disk, and plays rounds on an
//! interval until auto-bet finishes or Ctrl+C arrives.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use dindin::autobet::handle::AutoBetHandle;
use dindin::bonus::BonusSelector;
use dindin::config;
use dindin::dashboard::{self, routes::DashboardState};
use dindin::game::{GameLoop, Notifications};
use dindin::maintenance::MaintenanceStore;
use dindin::notify::SimulatedMailer;
use dindin::queue::TaskQueue;
use dindin::ratelimit::RateLimiter;
use dindin::types::GameError;

const BANNER: &str = r#"
 ____  _          ____  _
|  _ \(_)_ __    |  _ \(_)_ __
| | | | | '_ \ __| | | | | '_ \
| |_| | | | | |__| |_| | | | | |
|____/|_|_| |_|  |____/|_|_| |_|

  Crash-style multiplier game
  v0.1.0: Auto-bet simulator
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        game = %cfg.game.name,
        round_interval_secs = cfg.game.round_interval_secs,
        initial_balance = %cfg.game.initial_balance,
        seed = ?cfg.game.seed,
        "DIN-DIN starting up"
    );

    // -- Initialise components -------------------------------------------

    let maintenance = Arc::new(MaintenanceStore::open(cfg.maintenance.state_file.clone()));
    if maintenance.is_enabled().await {
        warn!("Maintenance mode is on; rounds are paused until it is switched off");
    }

    let queue: TaskQueue<()> = TaskQueue::with_config(cfg.queue.clone());

    let autobet = AutoBetHandle::spawn(cfg.auto_bet.clone());
    autobet.start().await?;

    let selector = BonusSelector::standard(cfg.game.seed);
    let mut game = GameLoop::new(cfg.game.clone(), autobet.clone(), selector)
        .with_maintenance(Arc::clone(&maintenance));
    if cfg.notifications.enabled {
        game = game.with_notifications(Notifications {
            queue: queue.clone(),
            mailer: Arc::new(SimulatedMailer::new(Duration::from_millis(
                cfg.notifications.mailer_latency_ms,
            ))),
            threshold: cfg.notifications.big_win_threshold,
        });
    }

    let dashboard_state = Arc::new(DashboardState::new(
        cfg.game.name.clone(),
        cfg.game.initial_balance,
        Arc::clone(&maintenance),
        RateLimiter::new(&cfg.rate_limit),
        Some(queue.clone()),
    ));
    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(Arc::clone(&dashboard_state), cfg.dashboard.port)
            .await
            .context("Dashboard failed to start")?;
    }

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.game.round_interval_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.game.round_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match game.play_round().await {
                    Ok(report) => {
                        let snapshot = autobet.snapshot().await.ok();
                        let finished = !autobet.should_continue_betting().await.unwrap_or(false);
                        let watched = report.stake.is_none();
                        dashboard_state.record_round(report, snapshot).await;
                        if watched && finished {
                            info!("Auto-bet finished. Shutting down.");
                            break;
                        }
                    }
                    Err(GameError::Maintenance) => {
                        info!("Maintenance mode on, skipping round");
                    }
                    Err(e) => {
                        error!(error = %e, "Round failed, stopping");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Let queued emails go out before exiting.
    queue.wait_idle().await;
    log_session_summary(&game);

    Ok(())
}

/// Log the closing summary for the player session.
fn log_session_summary(game: &GameLoop) {
    let s = game.session();
    info!(
        player = %s.player,
        rounds = game.round_number(),
        bets = s.bets_placed(),
        wins = s.bets_won(),
        wagered = %s.total_wagered(),
        paid_out = %s.total_paid_out(),
        net = %s.net(),
        balance = %s.balance(),
        "DIN-DIN shut down cleanly."
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dindin=info"));

    let json_logging = std::env::var("DINDIN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
