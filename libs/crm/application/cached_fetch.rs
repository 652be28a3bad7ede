//! Cache-or-fetch over the shared response cache
//!
//! A read returns the cached payload when it is present, fresh and owned by
//! the caller; otherwise the fetch callback runs and its result is stored.
//! A failed fetch leaves whatever was cached untouched. The cache lock is
//! never held across the fetch or a file write.
//!
//! Stored responses only mark the cache dirty; the file is rewritten on
//! invalidation, on `persist` and when the cache is dropped.

use super::error::Result;
use crate::infrastructure::cache::{CacheKey, CacheTtls, ResponseCache};
use crate::infrastructure::client::webhook::{decode_list, decode_single};
use crate::infrastructure::client::{Webhook, WebhookRequest};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedCache = Arc<Mutex<ResponseCache>>;

#[derive(Clone)]
pub struct CachedFetcher {
    cache: SharedCache,
    ttls: CacheTtls,
}

impl CachedFetcher {
    pub fn new(cache: SharedCache, ttls: CacheTtls) -> Self {
        Self { cache, ttls }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.cache.lock().now()
    }

    /// Cached value for `key`, if fresh and owned by `owner`
    pub fn cached<T: DeserializeOwned>(&self, key: &CacheKey, owner: Option<&str>) -> Option<T> {
        let ttl = self.ttls.ttl_for(key);
        let payload = {
            let mut cache = self.cache.lock();
            match owner {
                Some(owner) => cache.get_for_owner(key, ttl, owner),
                None => cache.get(key, ttl),
            }
        }?;

        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key.storage_key(), "Dropping undecodable cache entry: {}", e);
                self.cache.lock().remove(key);
                None
            }
        }
    }

    /// Return the cached value or run `fetch` and store its result
    ///
    /// `force` skips the cache read but still stores the fresh result.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: CacheKey,
        owner: Option<&str>,
        force: bool,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force {
            if let Some(value) = self.cached(&key, owner) {
                debug!(key = %key.storage_key(), "Cache hit");
                return Ok(value);
            }
            debug!(key = %key.storage_key(), "Cache miss");
        }

        let value = fetch().await?;
        self.store(key, &value, owner);
        Ok(value)
    }

    /// Store a value in memory; written out by the next `persist`
    pub fn store<T: Serialize>(&self, key: CacheKey, value: &T, owner: Option<&str>) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key.storage_key(), "Failed to serialize value for cache: {}", e);
                return;
            }
        };

        self.cache.lock().insert(key, payload, owner);
    }

    /// Write pending changes to the cache file
    pub fn persist(&self) -> Result<()> {
        let Some(snapshot) = self.cache.lock().snapshot()? else {
            return Ok(());
        };

        if let Err(e) = snapshot.write() {
            self.cache.lock().mark_dirty();
            return Err(e.into());
        }
        Ok(())
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist cache: {}", e);
        }
    }

    /// Drop one key
    pub fn invalidate(&self, key: &CacheKey) {
        let removed = self.cache.lock().remove(key).is_some();
        if removed {
            debug!(key = %key.storage_key(), "Invalidated cache entry");
            self.persist_or_warn();
        }
    }

    /// Drop every key matching `predicate`
    pub fn invalidate_where(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let removed = self.cache.lock().remove_where(predicate);
        if removed > 0 {
            self.persist_or_warn();
        }
        removed
    }

    /// Drop everything cached for one lead
    pub fn invalidate_lead(&self, lead_id: &str) -> usize {
        self.invalidate_where(|key| key.lead_id() == Some(lead_id))
    }

    /// Drop the whole cache
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.persist_or_warn();
    }
}

/// Send `request` and decode a list response
pub async fn fetch_list<T: DeserializeOwned>(
    webhook: &dyn Webhook,
    request: &WebhookRequest,
) -> Result<Vec<T>> {
    let value = webhook.call(request).await?;
    let rows: Vec<T> = decode_list(value)?;
    debug!(source = request.source(), "Fetched {} rows", rows.len());
    Ok(rows)
}

/// Send `request` and decode a single-record response
pub async fn fetch_single<T: DeserializeOwned>(
    webhook: &dyn Webhook,
    request: &WebhookRequest,
) -> Result<T> {
    let value = webhook.call(request).await?;
    Ok(decode_single(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::CrmError;
    use crate::infrastructure::client::WebhookError;
    use crate::infrastructure::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fetcher(clock: &ManualClock) -> CachedFetcher {
        let cache = ResponseCache::in_memory(Arc::new(clock.clone()));
        CachedFetcher::new(Arc::new(Mutex::new(cache)), CacheTtls::default())
    }

    fn key() -> CacheKey {
        CacheKey::AllTasks {
            emp_id: "emp123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let clock = ManualClock::default();
        let fetcher = fetcher(&clock);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<u32> = fetcher
                .get_or_fetch(key(), Some("emp123"), false, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_bypasses_cache() {
        let clock = ManualClock::default();
        let fetcher = fetcher(&clock);
        let calls = AtomicUsize::new(0);

        for force in [false, true] {
            let _: Vec<u32> = fetcher
                .get_or_fetch(key(), None, force, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_entry() {
        let clock = ManualClock::default();
        let fetcher = fetcher(&clock);
        fetcher.store(key(), &vec![7u32], None);

        let result: Result<Vec<u32>> = fetcher
            .get_or_fetch(key(), None, true, || async {
                Err(CrmError::Webhook(WebhookError::DeserializeFailed("boom".into())))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(fetcher.cached::<Vec<u32>>(&key(), None), Some(vec![7]));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_dropped() {
        let clock = ManualClock::default();
        let fetcher = fetcher(&clock);
        fetcher.store(key(), &"not a list", None);

        assert!(fetcher.cached::<Vec<u32>>(&key(), None).is_none());
        assert!(!fetcher.cache().lock().contains(&key()));
    }

    #[tokio::test]
    async fn test_store_defers_file_write_until_persist() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let clock = ManualClock::default();
        let cache = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
        let fetcher = CachedFetcher::new(Arc::new(Mutex::new(cache)), CacheTtls::default());

        for tick in 0..3u32 {
            fetcher.store(key(), &vec![tick], None);
        }
        assert!(fetcher.cache().lock().is_dirty());
        let on_disk = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
        assert!(on_disk.is_empty());

        fetcher.persist().unwrap();
        assert!(!fetcher.cache().lock().is_dirty());
        let on_disk = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
        assert!(on_disk.contains(&key()));
    }

    #[tokio::test]
    async fn test_invalidate_writes_through() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let clock = ManualClock::default();
        let cache = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
        let fetcher = CachedFetcher::new(Arc::new(Mutex::new(cache)), CacheTtls::default());

        fetcher.store(key(), &vec![1u32], None);
        fetcher.persist().unwrap();
        fetcher.invalidate(&key());

        let on_disk = ResponseCache::load(temp.path(), Arc::new(clock.clone())).unwrap();
        assert!(on_disk.is_empty());
    }
}
