//! Row fingerprints and poll-to-poll diffing
//!
//! A fingerprint is a SHA-256 digest over a fixed subset of a record's
//! fields. Each field is encoded as a presence tag followed by its length
//! and bytes, so field values containing any separator character cannot
//! produce the same digest as a different split of the same text.

use super::models::{Comment, Lead, Referral, Task};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Record id -> fingerprint
pub type FingerprintMap = HashMap<String, String>;

/// Records that can be tracked between poll ticks
pub trait Fingerprint {
    /// Stable identifier of the record
    fn record_id(&self) -> &str;

    /// Tracked fields, in a fixed order
    fn fingerprint_fields(&self) -> Vec<Option<&str>>;

    /// Digest of the tracked fields
    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in self.fingerprint_fields() {
            match field {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_le_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hex::encode(hasher.finalize())
    }
}

impl Fingerprint for Lead {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn fingerprint_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            Some(self.phone.as_str()),
            self.email.as_deref(),
            Some(self.status.as_str()),
            self.assigned_to.as_deref(),
            self.follow_up_date.as_deref(),
            self.remarks.as_deref(),
            self.updated_at.as_deref(),
        ]
    }
}

impl Fingerprint for Task {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn fingerprint_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.assigned_to.as_deref(),
            self.due_date.as_deref(),
            Some(self.status.as_str()),
            self.priority.as_deref(),
        ]
    }
}

impl Fingerprint for Comment {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn fingerprint_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.text.as_str()), self.author.as_deref()]
    }
}

impl Fingerprint for Referral {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn fingerprint_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.candidate_name.as_str()),
            Some(self.candidate_phone.as_str()),
            self.position.as_deref(),
            self.status.as_deref(),
        ]
    }
}

/// Classification of a row against the previous tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowChange {
    New,
    Modified,
    Unchanged,
}

impl RowChange {
    /// Whether the row should be highlighted
    pub fn is_change(&self) -> bool {
        !matches!(self, RowChange::Unchanged)
    }
}

/// Result of comparing one poll tick against the previous one
#[derive(Debug, Clone, Default)]
pub struct RowDiff {
    /// Per-row classification, in row order
    pub changes: Vec<(String, RowChange)>,

    /// Ids present in the previous tick but absent now
    pub removed: Vec<String>,

    /// Fingerprints of this tick, to be kept for the next comparison
    pub current: FingerprintMap,
}

impl RowDiff {
    pub fn change_for(&self, id: &str) -> Option<RowChange> {
        self.changes
            .iter()
            .find(|(row_id, _)| row_id == id)
            .map(|(_, change)| *change)
    }

    pub fn new_ids(&self) -> Vec<&str> {
        self.ids_with(RowChange::New)
    }

    pub fn modified_ids(&self) -> Vec<&str> {
        self.ids_with(RowChange::Modified)
    }

    pub fn has_changes(&self) -> bool {
        !self.removed.is_empty() || self.changes.iter().any(|(_, c)| c.is_change())
    }

    fn ids_with(&self, kind: RowChange) -> Vec<&str> {
        self.changes
            .iter()
            .filter(|(_, change)| *change == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Build the fingerprint map for a set of rows
pub fn fingerprint_map<T: Fingerprint>(rows: &[T]) -> FingerprintMap {
    rows.iter()
        .map(|row| (row.record_id().to_string(), row.fingerprint()))
        .collect()
}

/// Classify rows against the previous tick's fingerprints
///
/// With no previous map (first load) every row is `Unchanged`.
pub fn diff_rows<T: Fingerprint>(previous: Option<&FingerprintMap>, rows: &[T]) -> RowDiff {
    let mut current = FingerprintMap::with_capacity(rows.len());

    let changes = rows
        .iter()
        .map(|row| {
            let id = row.record_id().to_string();
            let fingerprint = row.fingerprint();
            let change = match previous {
                None => RowChange::Unchanged,
                Some(prev) => match prev.get(&id) {
                    None => RowChange::New,
                    Some(old) if *old != fingerprint => RowChange::Modified,
                    Some(_) => RowChange::Unchanged,
                },
            };
            if current.insert(id.clone(), fingerprint).is_some() {
                warn!(record_id = %id, "Duplicate record id in poll result");
            }
            (id, change)
        })
        .collect();

    let removed = match previous {
        None => Vec::new(),
        Some(prev) => {
            let present: HashSet<&str> = rows.iter().map(|r| r.record_id()).collect();
            let mut removed: Vec<String> = prev
                .keys()
                .filter(|id| !present.contains(id.as_str()))
                .cloned()
                .collect();
            removed.sort();
            removed
        }
    };

    RowDiff {
        changes,
        removed,
        current,
    }
}
