//! In-memory priority task queue.
//!
//! Defers asynchronous side-effect work (notification sends and the like)
//! and runs at most `max_concurrent` tasks at a time on the tokio runtime.
//! Pending tasks are ordered by priority (highest first), then by insertion.
//! There is no retry policy. A failing task is logged and swallowed, and its
//! callbacks receive `None`.
//!
//! One dispatcher task per queue owns every in-flight future. Tasks are
//! first polled in the order they leave the pending list, whatever the
//! runtime flavor.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{debug, warn};
use uuid::Uuid;

pub type TaskId = Uuid;

type TaskFuture<T> = BoxFuture<'static, anyhow::Result<T>>;
type Callback<T> = Box<dyn FnOnce(Option<T>) + Send + 'static>;
type Running<T> = FuturesUnordered<BoxFuture<'static, (TaskId, i32, Option<T>)>>;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
const DEFAULT_HISTORY_LIMIT: usize = 1_000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Finished task records kept for `status()` lookups.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Task records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: u64,
    pub failed: u64,
}

struct PendingTask<T> {
    id: TaskId,
    priority: i32,
    seq: u64,
    future: TaskFuture<T>,
}

struct Inner<T> {
    pending: Vec<PendingTask<T>>,
    statuses: HashMap<TaskId, TaskStatus>,
    callbacks: HashMap<TaskId, Vec<Callback<T>>>,
    finished: VecDeque<TaskId>,
    in_flight: usize,
    next_seq: u64,
    dispatching: bool,
    completed: u64,
    failed: u64,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    config: QueueConfig,
    /// New pending work for a running dispatcher.
    wake: Notify,
    idle: Notify,
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Cheap to clone; clones share one queue.
///
/// `enqueue` must be called from within a tokio runtime.
pub struct TaskQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::with_config(QueueConfig::default())
    }
}

impl<T: Clone + Send + 'static> TaskQueue<T> {
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_config(QueueConfig {
            max_concurrent,
            ..QueueConfig::default()
        })
    }

    pub fn with_config(mut config: QueueConfig) -> Self {
        if config.max_concurrent == 0 {
            warn!("Queue max_concurrent of 0 would never run anything, using 1");
            config.max_concurrent = 1;
        }
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    pending: Vec::new(),
                    statuses: HashMap::new(),
                    callbacks: HashMap::new(),
                    finished: VecDeque::new(),
                    in_flight: 0,
                    next_seq: 0,
                    dispatching: false,
                    completed: 0,
                    failed: 0,
                }),
                config,
                wake: Notify::new(),
                idle: Notify::new(),
            }),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.shared.config.max_concurrent
    }

    /// Add a task. Higher `priority` runs first.
    ///
    /// The dispatcher starts on a later scheduler turn, so tasks enqueued
    /// back-to-back are ordered against each other before any of them runs.
    pub fn enqueue<F>(&self, task: F, priority: i32) -> TaskId
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.enqueue_as(Uuid::new_v4(), task, priority)
    }

    /// [`enqueue`](Self::enqueue) with a completion callback attached up front.
    pub fn enqueue_with_callback<F, C>(&self, task: F, priority: i32, callback: C) -> TaskId
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        C: FnOnce(Option<T>) + Send + 'static,
    {
        // Registered before the task becomes visible to the dispatcher.
        let id = Uuid::new_v4();
        {
            let mut inner = self.shared.lock();
            inner.callbacks.insert(id, vec![Box::new(callback)]);
        }
        self.enqueue_as(id, task, priority)
    }

    fn enqueue_as<F>(&self, id: TaskId, task: F, priority: i32) -> TaskId
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let spawn = {
            let mut inner = self.shared.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.pending.push(PendingTask {
                id,
                priority,
                seq,
                future: task.boxed(),
            });
            inner
                .pending
                .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
            inner.statuses.insert(id, TaskStatus::Pending);
            !std::mem::replace(&mut inner.dispatching, true)
        };

        debug!(task_id = %id, priority, "Task enqueued");

        if spawn {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.dispatch().await });
        } else {
            self.shared.wake.notify_one();
        }
        id
    }

    /// Register a callback for a pending or running task.
    /// Returns false if the task is unknown or already finished.
    pub fn on_complete<C>(&self, id: TaskId, callback: C) -> bool
    where
        C: FnOnce(Option<T>) + Send + 'static,
    {
        let mut inner = self.shared.lock();
        let open = matches!(
            inner.statuses.get(&id),
            Some(TaskStatus::Pending | TaskStatus::Processing)
        );
        if open {
            inner.callbacks.entry(id).or_default().push(Box::new(callback));
        }
        open
    }

    /// Remove a task that has not started yet. Its callbacks never fire.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        let cancelled = {
            let mut inner = self.shared.lock();
            match inner.pending.iter().position(|t| t.id == id) {
                Some(pos) => {
                    inner.pending.remove(pos);
                    inner.statuses.remove(&id);
                    inner.callbacks.remove(&id);
                    true
                }
                None => false,
            }
        };
        if cancelled {
            debug!(task_id = %id, "Task cancelled");
            self.shared.notify_if_idle();
        }
        cancelled
    }

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.shared.lock().statuses.get(&id).copied()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.shared.lock();
        QueueStats {
            pending: inner.pending.len(),
            processing: inner.in_flight,
            completed: inner.completed,
            failed: inner.failed,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.shared.lock().is_idle()
    }

    /// Resolve once nothing is pending or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl<T> Inner<T> {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

impl<T: Clone + Send + 'static> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Nothing under the lock can leave `Inner` half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify_if_idle(&self) {
        if self.lock().is_idle() {
            self.idle.notify_waiters();
        }
    }

    /// Owns the in-flight set until the queue runs dry.
    async fn dispatch(self: Arc<Self>) {
        let mut running: Running<T> = FuturesUnordered::new();
        loop {
            if !self.fill(&mut running) {
                break;
            }
            tokio::select! {
                biased;
                Some((id, priority, value)) = running.next() => self.finish(id, priority, value),
                _ = self.wake.notified() => {}
            }
        }
        self.notify_if_idle();
    }

    /// Move pending tasks into `running` up to the concurrency limit.
    /// Returns false, and releases the dispatcher slot, once there is
    /// nothing left to run or wait for.
    fn fill(&self, running: &mut Running<T>) -> bool {
        let mut inner = self.lock();
        while inner.in_flight < self.config.max_concurrent && !inner.pending.is_empty() {
            let task = inner.pending.remove(0);
            inner.in_flight += 1;
            inner.statuses.insert(task.id, TaskStatus::Processing);
            debug!(task_id = %task.id, priority = task.priority, "Task started");
            running.push(run(task));
        }
        if running.is_empty() {
            inner.dispatching = false;
            return false;
        }
        true
    }

    fn finish(&self, id: TaskId, priority: i32, value: Option<T>) {
        let callbacks = {
            let mut inner = self.lock();
            inner.in_flight -= 1;
            let status = if value.is_some() {
                inner.completed += 1;
                TaskStatus::Completed
            } else {
                inner.failed += 1;
                TaskStatus::Failed
            };
            inner.statuses.insert(id, status);
            inner.finished.push_back(id);
            while inner.finished.len() > self.config.history_limit {
                if let Some(old) = inner.finished.pop_front() {
                    inner.statuses.remove(&old);
                }
            }
            inner.callbacks.remove(&id).unwrap_or_default()
        };

        debug!(task_id = %id, priority, ok = value.is_some(), callbacks = callbacks.len(), "Task finished");

        for callback in callbacks {
            let arg = value.clone();
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(arg))).is_err() {
                warn!(task_id = %id, "Task callback panicked");
            }
        }
        self.notify_if_idle();
    }
}

/// Run one task to completion, turning errors and panics into `None`.
fn run<T: Send + 'static>(task: PendingTask<T>) -> BoxFuture<'static, (TaskId, i32, Option<T>)> {
    let PendingTask {
        id,
        priority,
        future,
        ..
    } = task;
    async move {
        let value = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(task_id = %id, priority, error = format!("{e:#}"), "Task failed");
                None
            }
            Err(_) => {
                warn!(task_id = %id, priority, "Task panicked");
                None
            }
        };
        (id, priority, value)
    }
    .boxed()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
