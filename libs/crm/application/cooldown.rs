//! Manual refresh throttling
//!
//! Advisory only: it limits how often this client asks for a full refresh
//! and has no bearing on backend rate limits.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct RefreshCooldown {
    window: Duration,
    last: Option<DateTime<Utc>>,
}

impl RefreshCooldown {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Arm the window, or return how long until the next refresh is allowed
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> Result<(), Duration> {
        let remaining = self.remaining(now);
        if remaining > Duration::zero() {
            return Err(remaining);
        }
        self.last = Some(now);
        Ok(())
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.last {
            Some(last) => (last + self.window - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
