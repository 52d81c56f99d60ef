//! Task queue behaviour as seen by email delivery.

use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dindin::notify::{self, OutgoingEmail};
use dindin::queue::{QueueConfig, TaskQueue, TaskStatus};

use crate::mock_mailer::RecordingMailer;

fn email(round: u64) -> OutgoingEmail {
    OutgoingEmail::big_win("ana@example.com", round, dec!(100), 10.0)
}

#[tokio::test]
async fn test_emails_delivered_in_priority_order() {
    let queue: TaskQueue<()> = TaskQueue::new(1);
    let mailer = RecordingMailer::new();

    for (round, priority) in [(1, 1), (2, 10), (3, 5)] {
        notify::enqueue_email(&queue, Arc::new(mailer.clone()), email(round), priority);
    }
    queue.wait_idle().await;

    let subjects: Vec<String> = mailer.sent().into_iter().map(|e| e.subject).collect();
    assert!(subjects[0].contains("#2"));
    assert!(subjects[1].contains("#3"));
    assert!(subjects[2].contains("#1"));
}

#[tokio::test]
async fn test_failed_delivery_marks_task_failed() {
    let queue: TaskQueue<()> = TaskQueue::default();
    let mailer = RecordingMailer::new();
    mailer.set_error("smtp down");

    let id = notify::enqueue_email(&queue, Arc::new(mailer.clone()), email(7), 0);
    let outcome = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&outcome);
    assert!(queue.on_complete(id, move |r| *seen.lock().unwrap() = Some(r.is_some())));
    queue.wait_idle().await;

    assert_eq!(queue.status(id), Some(TaskStatus::Failed));
    assert_eq!(*outcome.lock().unwrap(), Some(false));
    assert!(mailer.sent().is_empty());
    assert_eq!(queue.stats().failed, 1);
}

#[tokio::test]
async fn test_queue_keeps_draining_after_failures() {
    let queue: TaskQueue<u32> = TaskQueue::with_config(QueueConfig {
        max_concurrent: 2,
        history_limit: 100,
    });

    let mut ids = Vec::new();
    for n in 0..10u32 {
        ids.push(queue.enqueue(
            async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                if n % 3 == 0 {
                    anyhow::bail!("task {n} failed");
                }
                Ok(n)
            },
            0,
        ));
    }
    queue.wait_idle().await;

    let stats = queue.stats();
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.completed, 6);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.processing, 0);
    assert_eq!(queue.status(ids[1]), Some(TaskStatus::Completed));
}
