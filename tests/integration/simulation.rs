//! Full-session simulation harness.
//!
//! Plays seeded sessions end to end through the game loop, the auto-bet
//! actor and the notification queue, then checks the books balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use dindin::autobet::handle::AutoBetHandle;
use dindin::autobet::AutoBetSettings;
use dindin::bonus::BonusSelector;
use dindin::config::GameConfig;
use dindin::game::{GameLoop, Notifications};
use dindin::queue::TaskQueue;
use dindin::types::RoundResult;

use crate::mock_mailer::RecordingMailer;

fn game_config(seed: u64, balance: Decimal) -> GameConfig {
    GameConfig {
        seed: Some(seed),
        initial_balance: balance,
        ..GameConfig::default()
    }
}

/// A Wednesday outside every seasonal window.
fn ordinary_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 13).unwrap()
}

async fn started(settings: AutoBetSettings) -> AutoBetHandle {
    let handle = AutoBetHandle::spawn(settings);
    handle.start().await.unwrap();
    handle
}

#[tokio::test]
async fn test_session_books_balance() {
    let mut settings = AutoBetSettings::new(dec!(10), 100);
    settings.auto_cashout = Some(2.0);
    settings.increase_on_loss = Some(dec!(50));
    settings.reset_after_win = true;

    let cfg = game_config(2026, dec!(100_000));
    let handle = started(settings).await;
    let mut game = GameLoop::new(cfg.clone(), handle.clone(), BonusSelector::standard(cfg.seed))
        .with_calendar_date(ordinary_day());

    let mut won = Decimal::ZERO;
    let mut lost = Decimal::ZERO;
    while handle.should_continue_betting().await.unwrap() {
        let report = game.play_round().await.unwrap();
        match report.result {
            Some(RoundResult { won: true, amount }) => won += amount,
            Some(RoundResult { won: false, amount }) => lost += amount,
            None => break,
        }
    }

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.rounds_remaining, 0);
    assert_eq!(snap.total_won, won);
    assert_eq!(snap.total_lost, lost);

    let s = game.session();
    assert_eq!(s.bets_placed(), 100);
    assert_eq!(s.balance(), dec!(100_000) + won - lost);
    assert_eq!(s.net(), won - lost);
}

#[tokio::test]
async fn test_stop_on_loss_ends_session_early() {
    let mut settings = AutoBetSettings::new(dec!(10), 1_000);
    settings.stop_on_loss = Some(dec!(30));

    let cfg = game_config(11, dec!(1_000));
    let handle = started(settings).await;
    let mut game = GameLoop::new(cfg.clone(), handle.clone(), BonusSelector::standard(cfg.seed))
        .with_calendar_date(ordinary_day());

    // No cash-out target: every bet loses, three losses hit the limit.
    while handle.should_continue_betting().await.unwrap() {
        game.play_round().await.unwrap();
    }
    assert_eq!(game.session().bets_placed(), 3);
    assert_eq!(game.session().balance(), dec!(970));
    assert_eq!(handle.snapshot().await.unwrap().rounds_remaining, 997);
}

#[tokio::test]
async fn test_big_win_emails_reach_mailer() {
    let mut settings = AutoBetSettings::new(dec!(10), 30);
    settings.auto_cashout = Some(1.2);

    let cfg = game_config(5, dec!(1_000));
    let handle = started(settings).await;
    let queue: TaskQueue<()> = TaskQueue::default();
    let mailer = RecordingMailer::new();

    let mut game = GameLoop::new(cfg.clone(), handle, BonusSelector::standard(cfg.seed))
        .with_calendar_date(ordinary_day())
        .with_notifications(Notifications {
            queue: queue.clone(),
            mailer: Arc::new(mailer.clone()),
            threshold: dec!(12),
        });

    let mut expected = 0;
    for _ in 0..30 {
        let report = game.play_round().await.unwrap();
        if report.cashed_out_at.is_some() && report.payout >= dec!(12) {
            expected += 1;
        }
    }
    queue.wait_idle().await;

    let sent = mailer.sent();
    assert_eq!(sent.len(), expected);
    assert!(sent.iter().all(|e| e.to == cfg.player_email));
}
