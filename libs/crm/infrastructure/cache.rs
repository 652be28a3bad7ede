//! Persistent response cache
//!
//! Keyed JSON blobs with a timestamp and owner identity, stored together in
//! one JSON file. Entries expire per key kind; an expired entry is removed
//! the first time it is read. Concurrent processes writing the same file
//! follow last-write-wins.

use super::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse cache JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Identity of a cached blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKey {
    Leads { emp_id: String, email: String },
    LeadDetails { lead_id: String },
    LeadComments { lead_id: String },
    LeadTasks { lead_id: String },
    AllTasks { emp_id: String },
    Incentives { emp_id: String },
    Referrals { emp_id: String },
    AuthProfile,
}

impl CacheKey {
    /// Stable string key used in the cache file
    pub fn storage_key(&self) -> String {
        match self {
            CacheKey::Leads { emp_id, email } => format!("leads:{}:{}", emp_id, email),
            CacheKey::LeadDetails { lead_id } => format!("lead_details:{}", lead_id),
            CacheKey::LeadComments { lead_id } => format!("lead_comments:{}", lead_id),
            CacheKey::LeadTasks { lead_id } => format!("lead_tasks:{}", lead_id),
            CacheKey::AllTasks { emp_id } => format!("all_tasks:{}", emp_id),
            CacheKey::Incentives { emp_id } => format!("incentives:{}", emp_id),
            CacheKey::Referrals { emp_id } => format!("referrals:{}", emp_id),
            CacheKey::AuthProfile => "auth_profile".to_string(),
        }
    }

    /// Lead this key belongs to, for per-lead keys
    pub fn lead_id(&self) -> Option<&str> {
        match self {
            CacheKey::LeadDetails { lead_id }
            | CacheKey::LeadComments { lead_id }
            | CacheKey::LeadTasks { lead_id } => Some(lead_id),
            _ => None,
        }
    }
}

/// Time-to-live per key kind, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheTtls {
    #[serde(default = "default_list_ttl")]
    pub leads_secs: i64,
    #[serde(default = "default_details_ttl")]
    pub lead_details_secs: i64,
    #[serde(default = "default_list_ttl")]
    pub comments_secs: i64,
    #[serde(default = "default_list_ttl")]
    pub tasks_secs: i64,
    #[serde(default = "default_list_ttl")]
    pub reports_secs: i64,
    #[serde(default = "default_auth_ttl")]
    pub auth_profile_secs: i64,
}

fn default_list_ttl() -> i64 {
    5 * 60
}

fn default_details_ttl() -> i64 {
    10 * 60
}

fn default_auth_ttl() -> i64 {
    24 * 60 * 60
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            leads_secs: default_list_ttl(),
            lead_details_secs: default_details_ttl(),
            comments_secs: default_list_ttl(),
            tasks_secs: default_list_ttl(),
            reports_secs: default_list_ttl(),
            auth_profile_secs: default_auth_ttl(),
        }
    }
}

/// Upper bound for any configured duration (ten years)
pub const MAX_DURATION_SECS: i64 = 10 * 365 * 24 * 60 * 60;

impl CacheTtls {
    pub fn ttl_for(&self, key: &CacheKey) -> Duration {
        let secs = match key {
            CacheKey::Leads { .. } => self.leads_secs,
            CacheKey::LeadDetails { .. } => self.lead_details_secs,
            CacheKey::LeadComments { .. } => self.comments_secs,
            CacheKey::LeadTasks { .. } | CacheKey::AllTasks { .. } => self.tasks_secs,
            CacheKey::Incentives { .. } | CacheKey::Referrals { .. } => self.reports_secs,
            CacheKey::AuthProfile => self.auth_profile_secs,
        };
        Duration::seconds(secs.clamp(0, MAX_DURATION_SECS))
    }

    /// Every ttl is positive and at most `MAX_DURATION_SECS`
    pub fn all_in_range(&self) -> bool {
        [
            self.leads_secs,
            self.lead_details_secs,
            self.comments_secs,
            self.tasks_secs,
            self.reports_secs,
            self.auth_profile_secs,
        ]
        .iter()
        .all(|s| (1..=MAX_DURATION_SECS).contains(s))
    }
}

/// Entry in the response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,

    /// Response payload as returned by the backend
    pub payload: Value,

    /// When this payload was fetched
    pub stored_at: DateTime<Utc>,

    /// Employee id of the session that stored it
    #[serde(default)]
    pub owner: Option<String>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.stored_at < ttl
    }
}

/// Serialized cache contents waiting to be written
#[derive(Debug)]
pub struct CacheSnapshot {
    path: PathBuf,
    json: String,
    entries: usize,
}

impl CacheSnapshot {
    pub fn write(&self) -> Result<()> {
        debug!("Saving {} entries to cache file {:?}", self.entries, self.path);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &self.json)?;
        Ok(())
    }
}

/// Response cache manager
pub struct ResponseCache {
    /// Entries keyed by `CacheKey::storage_key`
    entries: HashMap<String, CacheEntry>,

    /// Backing file, `None` for a memory-only cache
    file_path: Option<PathBuf>,

    /// Whether cache has been modified since last save
    dirty: bool,

    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Load cache from JSON file
    pub fn load(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let entries = if file_path.exists() {
            debug!("Loading cache from {:?}", file_path);
            let content = fs::read_to_string(&file_path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("Cache file not found, starting with empty cache");
            HashMap::new()
        };

        debug!("Loaded {} entries from cache", entries.len());

        Ok(Self {
            entries,
            file_path: Some(file_path),
            dirty: false,
            clock,
        })
    }

    /// Empty cache that will overwrite `path` on save
    pub fn empty_at(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            file_path: Some(path.as_ref().to_path_buf()),
            dirty: false,
            clock,
        }
    }

    /// Cache that never touches disk
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            file_path: None,
            dirty: false,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a payload if present and younger than `ttl`
    ///
    /// A stale entry is removed and reported as a miss.
    pub fn get(&mut self, key: &CacheKey, ttl: Duration) -> Option<Value> {
        self.get_entry(key, ttl).map(|entry| entry.payload.clone())
    }

    /// Like `get`, but an entry stored by another owner is a miss
    pub fn get_for_owner(&mut self, key: &CacheKey, ttl: Duration, owner: &str) -> Option<Value> {
        let entry = self.get_entry(key, ttl)?;
        if entry.owner.as_deref() != Some(owner) {
            debug!(
                key = %key.storage_key(),
                "Cache entry belongs to another owner, ignoring"
            );
            return None;
        }
        Some(entry.payload.clone())
    }

    fn get_entry(&mut self, key: &CacheKey, ttl: Duration) -> Option<&CacheEntry> {
        let storage_key = key.storage_key();
        let now = self.clock.now();

        let fresh = self.entries.get(&storage_key)?.is_fresh(now, ttl);
        if !fresh {
            debug!(key = %storage_key, "Cache entry expired, removing");
            self.entries.remove(&storage_key);
            self.dirty = true;
            return None;
        }

        self.entries.get(&storage_key)
    }

    /// Insert or replace a payload, stamped with the current time
    pub fn insert(&mut self, key: CacheKey, payload: Value, owner: Option<&str>) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            owner: owner.map(str::to_string),
            key,
            payload,
        };
        self.entries.insert(entry.key.storage_key(), entry);
        self.dirty = true;
    }

    /// Remove entry by key
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let removed = self.entries.remove(&key.storage_key());
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Remove every per-lead entry of `lead_id`
    pub fn remove_lead(&mut self, lead_id: &str) -> usize {
        self.remove_where(|key| key.lead_id() == Some(lead_id))
    }

    /// Remove every entry whose key matches `predicate`
    pub fn remove_where(&mut self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.key));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Removed {} cache entries", removed);
            self.dirty = true;
        }
        removed
    }

    /// Drop everything
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!("Clearing {} cache entries", self.entries.len());
            self.entries.clear();
            self.dirty = true;
        }
    }

    /// Remove all entries older than their kind's TTL
    pub fn purge_expired(&mut self, ttls: &CacheTtls) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.is_fresh(now, ttls.ttl_for(&entry.key)));

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
            self.dirty = true;
        }
        removed
    }

    /// Save cache to JSON file
    pub fn save(&mut self) -> Result<()> {
        match self.snapshot()? {
            Some(snapshot) => snapshot.write(),
            None => Ok(()),
        }
    }

    /// Serialize pending changes and clear the dirty flag
    ///
    /// Returns `None` when there is nothing to write. The caller writes the
    /// snapshot, typically after releasing any lock around the cache, and
    /// calls `mark_dirty` if that write fails.
    pub fn snapshot(&mut self) -> Result<Option<CacheSnapshot>> {
        let Some(file_path) = &self.file_path else {
            self.dirty = false;
            return Ok(None);
        };

        if !self.dirty {
            debug!("Cache not modified, skipping save");
            return Ok(None);
        }

        let snapshot = CacheSnapshot {
            path: file_path.clone(),
            json: serde_json::to_string_pretty(&self.entries)?,
            entries: self.entries.len(),
        };
        self.dirty = false;
        Ok(Some(snapshot))
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Get cache statistics
    pub fn stats(&self, ttls: &CacheTtls) -> CacheStats {
        let now = self.clock.now();
        let total = self.entries.len();
        let fresh = self
            .entries
            .values()
            .filter(|e| e.is_fresh(now, ttls.ttl_for(&e.key)))
            .count();

        CacheStats {
            total,
            fresh,
            stale: total - fresh,
        }
    }

    /// Get number of entries in cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(&key.storage_key())
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
}

impl Drop for ResponseCache {
    fn drop(&mut self) {
        // Auto-save on drop
        if self.dirty {
            if let Err(e) = self.save() {
                warn!("Failed to save cache on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn leads_key() -> CacheKey {
        CacheKey::Leads {
            emp_id: "emp123".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(leads_key().storage_key(), "leads:emp123:a@b.com");
        assert_eq!(
            CacheKey::LeadTasks { lead_id: "9".to_string() }.storage_key(),
            "lead_tasks:9"
        );
        assert_eq!(CacheKey::AuthProfile.storage_key(), "auth_profile");
    }

    #[test]
    fn test_cache_load_empty() {
        let temp = NamedTempFile::new().unwrap();
        let cache = ResponseCache::load(temp.path(), Arc::new(ManualClock::default())).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_within_ttl_returns_value() {
        let clock = ManualClock::default();
        let mut cache = ResponseCache::in_memory(Arc::new(clock.clone()));
        let payload = json!([{"id": "1"}, {"id": "2"}]);

        cache.insert(leads_key(), payload.clone(), Some("emp123"));
        clock.advance(Duration::seconds(299));

        assert_eq!(cache.get(&leads_key(), Duration::seconds(300)), Some(payload));
    }

    #[test]
    fn test_get_after_ttl_misses_and_removes() {
        let clock = ManualClock::default();
        let mut cache = ResponseCache::in_memory(Arc::new(clock.clone()));

        cache.insert(leads_key(), json!([]), None);
        clock.advance(Duration::seconds(300));

        assert!(cache.get(&leads_key(), Duration::seconds(300)).is_none());
        assert!(!cache.contains(&leads_key()));
    }

    #[test]
    fn test_owner_mismatch_is_miss() {
        let mut cache = ResponseCache::in_memory(Arc::new(ManualClock::default()));
        cache.insert(leads_key(), json!([1]), Some("emp123"));

        let ttl = Duration::minutes(5);
        assert!(cache.get_for_owner(&leads_key(), ttl, "emp999").is_none());
        assert!(cache.get_for_owner(&leads_key(), ttl, "emp123").is_some());
    }

    #[test]
    fn test_remove_lead_only_touches_that_lead() {
        let mut cache = ResponseCache::in_memory(Arc::new(ManualClock::default()));
        for lead_id in ["1", "2"] {
            cache.insert(CacheKey::LeadDetails { lead_id: lead_id.into() }, json!({}), None);
            cache.insert(CacheKey::LeadComments { lead_id: lead_id.into() }, json!([]), None);
            cache.insert(CacheKey::LeadTasks { lead_id: lead_id.into() }, json!([]), None);
        }
        cache.insert(leads_key(), json!([]), None);

        assert_eq!(cache.remove_lead("1"), 3);
        assert_eq!(cache.len(), 4);
        assert!(cache.contains(&CacheKey::LeadDetails { lead_id: "2".into() }));
    }

    #[test]
    fn test_purge_expired_uses_per_kind_ttl() {
        let clock = ManualClock::default();
        let mut cache = ResponseCache::in_memory(Arc::new(clock.clone()));
        cache.insert(leads_key(), json!([]), None);
        cache.insert(CacheKey::AuthProfile, json!({}), None);

        clock.advance(Duration::hours(1));
        let ttls = CacheTtls::default();
        assert_eq!(cache.stats(&ttls).stale, 1);
        assert_eq!(cache.purge_expired(&ttls), 1);
        assert!(cache.contains(&CacheKey::AuthProfile));
    }

    #[test]
    fn test_ttls_out_of_range() {
        let mut ttls = CacheTtls::default();
        assert!(ttls.all_in_range());

        ttls.leads_secs = i64::MAX;
        assert!(!ttls.all_in_range());
        assert_eq!(ttls.ttl_for(&leads_key()), Duration::seconds(MAX_DURATION_SECS));

        ttls.leads_secs = 0;
        assert!(!ttls.all_in_range());
    }

    #[test]
    fn test_cache_save_and_load() {
        let temp = NamedTempFile::new().unwrap();
        let clock = ManualClock::default();

        // Create and save cache
        {
            let mut cache = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
            cache.insert(leads_key(), json!([{"id": "1"}]), Some("emp123"));
            cache.save().unwrap();
        }

        // Load and verify
        {
            let mut cache = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
            assert_eq!(cache.len(), 1);
            let value = cache.get(&leads_key(), Duration::minutes(5)).unwrap();
            assert_eq!(value, json!([{"id": "1"}]));
        }
    }
}
