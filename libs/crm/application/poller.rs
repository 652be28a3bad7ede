//! Shared poll service
//!
//! One tokio task per subscription. Each task fetches immediately, then on
//! every interval tick, diffs the rows through its own `ChangeTracker` and
//! publishes a `PollEvent` to the subscriber.
//!
//! ```text
//! ┌──────────────┐   tick   ┌─────────┐  rows  ┌──────────────┐  PollEvent  ┌──────────────┐
//! │ interval     ├─────────>│ fetch() ├───────>│ ChangeTracker├────────────>│ Subscription │
//! └──────────────┘          └─────────┘        └──────────────┘    mpsc     └──────────────┘
//! ```
//!
//! Missed ticks are skipped rather than burst. Cancelling or dropping a
//! subscription aborts its task, so no fetch starts after teardown.

use super::error::Result;
use super::highlighter::ChangeTracker;
use crate::domain::fingerprint::{Fingerprint, RowChange, RowDiff};
use crate::infrastructure::clock::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 16;
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one poll tick
#[derive(Debug, Clone)]
pub enum PollEvent<T> {
    Updated {
        rows: Vec<T>,
        diff: RowDiff,
        /// Rows still highlighted at this tick, including earlier changes
        highlighted: HashMap<String, RowChange>,
    },
    Failed {
        message: String,
    },
}

struct PollControl {
    interval_tx: watch::Sender<Duration>,
    handle: JoinHandle<()>,
}

type Registry = Arc<Mutex<HashMap<String, Arc<PollControl>>>>;

/// Receiving end of a poll subscription
pub struct Subscription<T> {
    name: String,
    events: mpsc::Receiver<PollEvent<T>>,
    control: Arc<PollControl>,
    registry: Registry,
}

impl<T> Subscription<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next tick's event; `None` once the task has stopped
    pub async fn next(&mut self) -> Option<PollEvent<T>> {
        self.events.recv().await
    }

    pub fn try_next(&mut self) -> Option<PollEvent<T>> {
        self.events.try_recv().ok()
    }

    /// Stop polling
    pub fn cancel(self) {
        // Drop does the work
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.control.handle.abort();

        let mut registry = self.registry.lock();
        if registry
            .get(&self.name)
            .is_some_and(|c| Arc::ptr_eq(c, &self.control))
        {
            registry.remove(&self.name);
        }
        debug!(subscription = %self.name, "Poll subscription cancelled");
    }
}

/// Owner of every running poll task
pub struct PollService {
    registry: Registry,
    clock: Arc<dyn Clock>,
    highlight: chrono::Duration,
}

impl PollService {
    pub fn new(clock: Arc<dyn Clock>, highlight: chrono::Duration) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            clock,
            highlight,
        }
    }

    /// Start polling `fetch` every `interval`
    ///
    /// A subscription already registered under `name` is stopped first.
    pub fn subscribe<T, F, Fut>(&self, name: impl Into<String>, interval: Duration, fetch: F) -> Subscription<T>
    where
        T: Fingerprint + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        let name = name.into();
        let interval = interval.max(MIN_INTERVAL);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (interval_tx, interval_rx) = watch::channel(interval);

        let tracker = ChangeTracker::new(self.highlight);
        let clock = Arc::clone(&self.clock);
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            poll_task(task_name, interval_rx, fetch, tracker, clock, events_tx).await;
        });

        let control = Arc::new(PollControl {
            interval_tx,
            handle,
        });

        if let Some(previous) = self.registry.lock().insert(name.clone(), Arc::clone(&control)) {
            previous.handle.abort();
        }

        info!(subscription = %name, "Polling every {:?}", interval);

        Subscription {
            name,
            events: events_rx,
            control,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Change the interval of a running subscription
    ///
    /// The next tick fires one full new interval from now.
    pub fn set_interval(&self, name: &str, interval: Duration) -> bool {
        let interval = interval.max(MIN_INTERVAL);
        match self.registry.lock().get(name) {
            Some(control) => {
                info!(subscription = %name, "Poll interval changed to {:?}", interval);
                control.interval_tx.send(interval).is_ok()
            }
            None => false,
        }
    }

    /// Names of running subscriptions
    pub fn active(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Stop every subscription
    pub fn shutdown(&self) {
        let mut registry = self.registry.lock();
        for (name, control) in registry.drain() {
            debug!(subscription = %name, "Stopping poll task");
            control.handle.abort();
        }
    }
}

impl Drop for PollService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn poll_task<T, F, Fut>(
    name: String,
    mut interval_rx: watch::Receiver<Duration>,
    fetch: F,
    mut tracker: ChangeTracker,
    clock: Arc<dyn Clock>,
    events_tx: mpsc::Sender<PollEvent<T>>,
) where
    T: Fingerprint,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let period = *interval_rx.borrow_and_update();
    // First tick fires immediately
    let mut ticker = interval_at(Instant::now(), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = interval_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let period = *interval_rx.borrow_and_update();
                ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                continue;
            }
            _ = ticker.tick() => {}
        }

        let event = match fetch().await {
            Ok(rows) => {
                let now = clock.now();
                let diff = tracker.observe(&rows, now);
                if diff.has_changes() {
                    debug!(
                        subscription = %name,
                        new = diff.new_ids().len(),
                        modified = diff.modified_ids().len(),
                        removed = diff.removed.len(),
                        "Rows changed"
                    );
                }
                PollEvent::Updated {
                    highlighted: tracker.active(now),
                    rows,
                    diff,
                }
            }
            Err(e) => {
                warn!(subscription = %name, "Poll fetch failed: {}", e);
                PollEvent::Failed {
                    message: e.to_string(),
                }
            }
        };

        if events_tx.send(event).await.is_err() {
            debug!(subscription = %name, "Subscriber gone, stopping poll task");
            break;
        }
    }
}
