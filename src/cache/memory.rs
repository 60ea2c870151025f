use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use super::{CacheError, CacheResult, CacheStore};

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Arc<str>,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was stored with.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process cache backed by Moka (TinyLFU admission, bounded capacity).
///
/// Counters live outside the bounded cache so capacity pressure can never
/// evict them.
#[derive(Clone)]
pub struct MemoryCacheStore {
    entries: Cache<String, CacheEntry>,
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemoryCacheStore {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(EntryExpiry)
                .build(),
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn counters(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, u64>>> {
        self.counters
            .lock()
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(value) = self.counters()?.get(key) {
            return Ok(Some(value.to_string()));
        }
        Ok(self.entries.get(key).map(|entry| entry.payload.to_string()))
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload: value.into(),
                ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.counters()?.remove(key);
        self.entries.invalidate(key);
        Ok(())
    }

    fn increment(&self, key: &str) -> CacheResult<u64> {
        let mut counters = self.counters()?;
        let counter = counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
