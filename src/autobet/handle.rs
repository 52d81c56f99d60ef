//! Shared front-end for the auto-bet manager.
//!
//! The manager runs on its own task and owns all of its state. Callers talk
//! to it through a single-consumer channel, so overlapping round results are
//! applied one after another in arrival order instead of being dropped.

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{AutoBetManager, AutoBetSettings, AutoBetSnapshot};
use crate::types::{GameError, RoundResult};

/// Bounded so a stalled consumer applies back-pressure instead of growing.
const COMMAND_BUFFER: usize = 64;

enum Command {
    Start(oneshot::Sender<()>),
    Stop(oneshot::Sender<()>),
    ShouldContinue(oneshot::Sender<bool>),
    ProcessResult(RoundResult, oneshot::Sender<AutoBetSnapshot>),
    ShouldCashOut(f64, oneshot::Sender<bool>),
    CurrentBet(oneshot::Sender<Decimal>),
    Snapshot(oneshot::Sender<AutoBetSnapshot>),
}

/// Cloneable handle to a running auto-bet manager.
#[derive(Clone)]
pub struct AutoBetHandle {
    tx: mpsc::Sender<Command>,
}

impl AutoBetHandle {
    /// Spawn a manager task on the current tokio runtime.
    pub fn spawn(settings: AutoBetSettings) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(AutoBetManager::new(settings), rx));
        Self { tx }
    }

    pub async fn start(&self) -> Result<(), GameError> {
        self.request(Command::Start).await
    }

    pub async fn stop(&self) -> Result<(), GameError> {
        self.request(Command::Stop).await
    }

    pub async fn should_continue_betting(&self) -> Result<bool, GameError> {
        self.request(Command::ShouldContinue).await
    }

    /// Queue a result; resolves with the state after it was applied.
    pub async fn process_round_result(
        &self,
        result: RoundResult,
    ) -> Result<AutoBetSnapshot, GameError> {
        self.request(|reply| Command::ProcessResult(result, reply)).await
    }

    pub async fn should_cash_out(&self, multiplier: f64) -> Result<bool, GameError> {
        self.request(|reply| Command::ShouldCashOut(multiplier, reply))
            .await
    }

    pub async fn current_bet_amount(&self) -> Result<Decimal, GameError> {
        self.request(Command::CurrentBet).await
    }

    pub async fn snapshot(&self) -> Result<AutoBetSnapshot, GameError> {
        self.request(Command::Snapshot).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GameError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| GameError::ChannelClosed)?;
        rx.await.map_err(|_| GameError::ChannelClosed)
    }
}

async fn run(mut manager: AutoBetManager, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        // A dropped reply receiver only means the caller stopped waiting.
        match cmd {
            Command::Start(reply) => {
                manager.start();
                let _ = reply.send(());
            }
            Command::Stop(reply) => {
                manager.stop();
                let _ = reply.send(());
            }
            Command::ShouldContinue(reply) => {
                let _ = reply.send(manager.should_continue_betting());
            }
            Command::ProcessResult(result, reply) => {
                manager.process_round_result(&result);
                let _ = reply.send(manager.snapshot());
            }
            Command::ShouldCashOut(multiplier, reply) => {
                let _ = reply.send(manager.should_cash_out(multiplier));
            }
            Command::CurrentBet(reply) => {
                let _ = reply.send(manager.current_bet_amount());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(manager.snapshot());
            }
        }
    }
    debug!("All auto-bet handles dropped, manager task exiting");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
