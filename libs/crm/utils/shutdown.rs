//! Graceful shutdown for the long-running watchers

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Shared stop signal; clones observe the same state
#[derive(Clone)]
pub struct ShutdownManager {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Spawn a Ctrl+C handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)");
                manager.trigger();
            }
        });
    }

    pub fn trigger(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been triggered
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Sender lives in self, so wait_for only fails if it is dropped
        let _ = rx.wait_for(|running| !*running).await;
    }

    /// Sleep for `duration`, waking early on shutdown
    pub async fn interruptible_sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wait() => {}
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
