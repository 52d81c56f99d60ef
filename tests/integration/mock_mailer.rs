//! Recording mailer for integration testing.
//!
//! Keeps every delivered email in memory and can be told to fail,
//! so tests can observe what the queue actually sent.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use dindin::notify::{Mailer, OutgoingEmail};

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    /// If set, every send fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_recording_mailer_records_and_fails() {
    let mailer = RecordingMailer::new();
    let email = OutgoingEmail::big_win("ana@example.com", 1, rust_decimal_macros::dec!(50), 5.0);

    mailer.send(&email).await.unwrap();
    assert_eq!(mailer.sent(), vec![email.clone()]);

    mailer.set_error("smtp down");
    assert!(mailer.send(&email).await.is_err());
    assert_eq!(mailer.sent().len(), 1);

    mailer.clear_error();
    mailer.send(&email).await.unwrap();
    assert_eq!(mailer.sent().len(), 2);
}
