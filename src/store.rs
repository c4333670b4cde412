//! Tag-scoped entry store over a byte backend.
//!
//! [`TaggedStore`] turns a resource into a [`ScopedKey`], encodes entries and
//! absorbs every store-side failure: a read that fails is a miss, a write that
//! fails is logged and dropped. Nothing from the backend propagates out of
//! [`lookup`](TaggedStore::lookup) or [`store`](TaggedStore::store).

use crate::backend::CacheBackend;
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::key::ScopedKey;
use crate::resource::CacheableResource;
use crate::serialization::{decode_entry, encode_entry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Store adapter with the namespace tag injected at construction.
#[derive(Clone)]
pub struct TaggedStore<B: CacheBackend> {
    backend: B,
    namespace: String,
}

impl<B: CacheBackend> TaggedStore<B> {
    pub fn new(backend: B, namespace: impl Into<String>) -> Self {
        TaggedStore {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key for a resource: namespace tag, then the resource's tags.
    pub fn key_for<R: CacheableResource>(&self, resource: &R) -> ScopedKey {
        ScopedKey::new(&self.namespace, resource.cache_tags(), resource.hash())
    }

    /// Fetch an entry. Unavailable store or unreadable bytes read as `None`.
    ///
    /// A returned entry is flagged `from_cache`; its `expires_in` and
    /// `queue_in` are filled in once the caller annotates it against the
    /// resource's times.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &ScopedKey) -> Option<CacheEntry<T>> {
        let storage_key = key.storage_key();

        let bytes = match self.backend.get(&storage_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Store unavailable on lookup of {}, treating as miss: {}", storage_key, e);
                return None;
            }
        };

        match decode_entry(&bytes) {
            Ok(mut entry) => {
                entry.mark_from_cache();
                Some(entry)
            }
            Err(e) => {
                warn!("Evicting unreadable entry {}: {}", storage_key, e);
                if let Err(e) = self.backend.delete(&storage_key).await {
                    debug!("Eviction of {} failed: {}", storage_key, e);
                }
                None
            }
        }
    }

    /// Write an entry, logging and dropping any failure. Returns whether the
    /// write went through.
    pub async fn store<T: Serialize>(
        &self,
        key: &ScopedKey,
        entry: &CacheEntry<T>,
        ttl: Duration,
    ) -> bool {
        match self.try_store(key, entry, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Store write of {} dropped: {}", key, e);
                false
            }
        }
    }

    /// Write an entry and report failures.
    ///
    /// # Errors
    /// `Error::SerializationError` or `Error::BackendError`.
    pub async fn try_store<T: Serialize>(
        &self,
        key: &ScopedKey,
        entry: &CacheEntry<T>,
        ttl: Duration,
    ) -> Result<()> {
        let bytes = encode_entry(entry)?;
        self.backend
            .set(&key.storage_key(), bytes, Some(ttl))
            .await
    }
}
