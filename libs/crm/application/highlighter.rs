//! Transient highlighting of rows that changed between poll ticks

use crate::domain::fingerprint::{diff_rows, Fingerprint, FingerprintMap, RowChange, RowDiff};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Active highlight on a row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub change: RowChange,
    pub expires_at: DateTime<Utc>,
}

/// Remembers the previous tick and which rows are currently highlighted
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    previous: Option<FingerprintMap>,
    highlights: HashMap<String, Highlight>,
    duration: Duration,
}

impl ChangeTracker {
    pub fn new(duration: Duration) -> Self {
        Self {
            previous: None,
            highlights: HashMap::new(),
            duration,
        }
    }

    /// Diff `rows` against the previous tick and highlight what changed
    pub fn observe<T: Fingerprint>(&mut self, rows: &[T], now: DateTime<Utc>) -> RowDiff {
        let diff = diff_rows(self.previous.as_ref(), rows);

        for (id, change) in &diff.changes {
            if change.is_change() {
                self.highlights.insert(
                    id.clone(),
                    Highlight {
                        change: *change,
                        expires_at: now + self.duration,
                    },
                );
            }
        }
        for id in &diff.removed {
            self.highlights.remove(id);
        }

        self.previous = Some(diff.current.clone());
        self.expire(now);
        diff
    }

    /// Active change for a row, if its highlight has not elapsed
    pub fn highlight(&self, id: &str, now: DateTime<Utc>) -> Option<RowChange> {
        self.highlights
            .get(id)
            .filter(|h| h.expires_at > now)
            .map(|h| h.change)
    }

    /// All rows highlighted at `now`
    pub fn active(&self, now: DateTime<Utc>) -> HashMap<String, RowChange> {
        self.highlights
            .iter()
            .filter(|(_, h)| h.expires_at > now)
            .map(|(id, h)| (id.clone(), h.change))
            .collect()
    }

    /// Drop elapsed highlights
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.highlights.len();
        self.highlights.retain(|_, h| h.expires_at > now);
        before - self.highlights.len()
    }

    /// Forget the previous tick; the next observation is a first load
    pub fn reset(&mut self) {
        self.previous = None;
        self.highlights.clear();
    }
}
