//! The cacheable resource collaborator.
//!
//! A [`CacheableResource`] describes one request for data: how to identify it
//! in the store, which tags scope it, its timing thresholds, the caller's
//! cache directives, and how to compute it on a miss. The cache never knows
//! what the data is or where it comes from.
//!
//! ```ignore
//! use refresh_kit::{CacheTimes, CacheableResource, Result};
//!
//! struct DailyRainfall {
//!     pool: sqlx::PgPool,
//!     station: String,
//! }
//!
//! impl CacheableResource for DailyRainfall {
//!     type Payload = Vec<f64>;
//!
//!     fn hash(&self) -> String {
//!         format!("rainfall:{}", self.station)
//!     }
//!
//!     fn cache_tags(&self) -> Vec<String> {
//!         vec!["rainfall".to_string()]
//!     }
//!
//!     fn cache_times(&self) -> CacheTimes {
//!         CacheTimes::from_secs(3600, 600, 30)
//!     }
//!
//!     async fn compute(&self) -> Result<Vec<f64>> {
//!         // SELECT ... FROM readings WHERE station = $1
//!         # unimplemented!()
//!     }
//! }
//! ```

use crate::error::Result;
use crate::options::RequestCacheOptions;
use crate::times::CacheTimes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

/// A resource whose computed value can be cached.
///
/// Implemented once per resource type. The service holds it in an `Arc` so a
/// background refresh can outlive the request that scheduled it.
pub trait CacheableResource: Send + Sync + 'static {
    /// The computed value. Owned by the entry once built.
    type Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Stable identity of the requested data, used as the store key.
    fn hash(&self) -> String;

    /// Tags applied to the stored entry, after the namespace tag.
    fn cache_tags(&self) -> Vec<String> {
        Vec::new()
    }

    fn cache_times(&self) -> CacheTimes;

    /// Directives for this request. Permissive by default.
    fn cache_options(&self) -> RequestCacheOptions {
        RequestCacheOptions::default()
    }

    /// Produce a fresh value. Called on a miss, a forced expiry, or from a
    /// background refresh.
    ///
    /// # Errors
    /// Should return `Error::ComputeError`; the error is handed back to the
    /// caller of `get` unchanged.
    fn compute(&self) -> impl Future<Output = Result<Self::Payload>> + Send;
}
