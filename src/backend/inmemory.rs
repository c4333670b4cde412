//! In-memory store (default, thread-safe).
//!
//! DashMap-backed with per-key sharding. TTL is checked lazily on access.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        StoredValue {
            data,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Thread-safe in-memory key/value store.
///
/// Clones share the same map.
///
/// ```no_run
/// use refresh_kit::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> refresh_kit::Result<()> {
///     let backend = InMemoryBackend::new();
///     backend.set("app:key", b"value".to_vec(), Some(Duration::from_secs(60))).await?;
///     assert!(backend.get("app:key").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, StoredValue>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, value| !value.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            debug!("InMemory purged {} expired keys", removed);
        }
        removed
    }

    /// Remaining TTL for a key, if it has one and is still live.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let value = self.store.get(key)?;
        value
            .expires_at
            .and_then(|exp| exp.checked_duration_since(Instant::now()))
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_entries: self.store.len(),
            expired_entries: self.store.iter().filter(|v| v.is_expired()).count(),
            total_bytes: self.store.iter().map(|v| v.data.len()).sum(),
        }
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let expired = match self.store.get(key) {
            Some(value) if !value.is_expired() => {
                trace!("InMemory GET {} -> HIT", key);
                return Ok(Some(value.data.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.store.remove_if(key, |_, value| value.is_expired());
        }
        trace!("InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), StoredValue::new(value, ttl));
        trace!("InMemory SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        trace!("InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(key).is_some_and(|v| !v.is_expired()))
    }
}

/// Store statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}
