//! Key/value store backends.
//!
//! The store is an external collaborator: this crate only needs byte-level
//! get/set with TTL. [`InMemoryBackend`] is the bundled implementation; plug
//! in Redis, Memcached or anything else by implementing [`CacheBackend`].

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::{InMemoryBackend, StoreStats};

/// Trait for key/value store implementations.
///
/// All methods take `&self`; implementations use interior mutability or
/// external storage. The returned futures are `Send` so refresh jobs that
/// touch the store can run on a multi-threaded executor. Implementations may
/// simply write `async fn`.
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Retrieve a value. Entries past their TTL must read as `Ok(None)`.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store a value with an optional TTL (`None` = backend default).
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or rejects the write.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a value.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key is present.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Health check, for readiness checks.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible.
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}
