//! Outgoing player notifications.
//!
//! The `Mailer` trait is the seam for email delivery. `SimulatedMailer`
//! stands in for a real provider: it waits a short latency and logs the send.
//! Sends are never awaited inline by the game loop; they go through the
//! [`TaskQueue`].

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::queue::{TaskId, TaskQueue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    /// Congratulation email for a large cash-out.
    pub fn big_win(to: &str, round: u64, payout: Decimal, multiplier: f64) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("Você ganhou {payout} na rodada #{round}!"),
            body: format!(
                "Parabéns! Você sacou em {multiplier:.2}x na rodada #{round} e recebeu {payout}."
            ),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

pub struct SimulatedMailer {
    latency: Duration,
    sent: AtomicU64,
}

impl SimulatedMailer {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            sent: AtomicU64::new(0),
        }
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Mailer for SimulatedMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(to = %email.to, subject = %email.subject, sent_total = n, "Email sent (simulated)");
        Ok(())
    }
}

/// Hand an email to the queue; delivery failures are logged by the queue.
pub fn enqueue_email(
    queue: &TaskQueue<()>,
    mailer: Arc<dyn Mailer>,
    email: OutgoingEmail,
    priority: i32,
) -> TaskId {
    queue.enqueue(async move { mailer.send(&email).await }, priority)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
