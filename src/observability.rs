//! Metrics hooks for cache decisions.
//!
//! Implement [`CacheMetrics`] to forward the orchestrator's decisions to a
//! monitoring system:
//!
//! ```ignore
//! use refresh_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _age: Duration) {
//!         // counter!("cache_hits").increment(1);
//!     }
//!     // ... implement other methods
//! }
//!
//! let service = CacheService::builder(backend)
//!     .with_metrics(Box::new(PrometheusMetrics))
//!     .build()?;
//! ```
//!
//! The default method bodies log through the `log` crate. [`NoOpMetrics`] is
//! used when nothing is configured.
//!
//! | Hook | Fired when |
//! |------|------------|
//! | `record_hit` | a cache-sourced entry is returned |
//! | `record_miss` | lookup found nothing usable |
//! | `record_recompute` | the producer ran synchronously |
//! | `record_throttled` | a recompute was refused by the guard |
//! | `record_refresh_dispatched` | a background refresh was accepted |
//! | `record_error` | compute failed, or a store/dispatch failure was swallowed |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// A cache-sourced entry was returned to the caller.
    fn record_hit(&self, key: &str, age: Duration) {
        debug!("Cache HIT: {} (age {:?})", key, age);
    }

    /// Nothing usable was found in the store.
    fn record_miss(&self, key: &str) {
        debug!("Cache MISS: {}", key);
    }

    /// The producer ran on the calling path.
    fn record_recompute(&self, key: &str, duration: Duration) {
        debug!("Cache RECOMPUTE: {} took {:?}", key, duration);
    }

    /// A recompute was refused by `only_if_cached` or the throttle window.
    fn record_throttled(&self, key: &str) {
        debug!("Cache THROTTLED: {}", key);
    }

    /// A background refresh was accepted by the task runner.
    fn record_refresh_dispatched(&self, key: &str) {
        debug!("Cache REFRESH DISPATCHED: {}", key);
    }

    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _age: Duration) {}
    fn record_miss(&self, _key: &str) {}
    fn record_recompute(&self, _key: &str, _duration: Duration) {}
    fn record_throttled(&self, _key: &str) {}
    fn record_refresh_dispatched(&self, _key: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Logs every hook at its default level.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
