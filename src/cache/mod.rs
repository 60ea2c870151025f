//! Key-value cache used in front of ad listing queries.
//!
//! The service talks to the cache only through [`CacheStore`]; the shipped
//! backend is the in-process [`MemoryCacheStore`].

use std::time::Duration;

use thiserror::Error;

pub mod keys;
pub mod memory;

pub use memory::MemoryCacheStore;

/// Failures reported by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache value under {key} is corrupt: {detail}")]
    Corrupt { key: String, detail: String },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Minimal key-value contract: string values, optional per-key expiry and an
/// atomic counter.
pub trait CacheStore {
    /// Fetch the value stored under `key`, if any and not expired.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// Store `value` under `key`; `ttl = None` keeps it until evicted.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;
    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> CacheResult<()>;
    /// Atomically increment the counter under `key` (missing counts as zero)
    /// and return the new value.
    fn increment(&self, key: &str) -> CacheResult<u64>;
}
