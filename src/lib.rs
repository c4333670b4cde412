//! # refresh-kit
//!
//! A read-through cache with stale-while-revalidate refresh for Rust services.
//!
//! ## Features
//!
//! - **Freshness tiers:** entries are fresh, due for a background refresh, or
//!   too old to serve, each judged against per-resource thresholds
//! - **Background refresh:** stale entries are served immediately while a
//!   refresh job runs on a pluggable [`RefreshDispatcher`]
//! - **Request directives:** `no-cache`, `max-age`, `only-if-cached` and
//!   `no-store`, parsed from a `Cache-Control` style header
//! - **Throttled recompute:** a minimum interval between producer calls per key
//! - **Degrades, never fails:** an unavailable store reads as a miss
//! - **Backend Agnostic:** in-memory backend included, bring your own via
//!   [`CacheBackend`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use refresh_kit::{
//!     CacheService, CacheableResource, CacheTimes, RequestCacheOptions,
//!     backend::InMemoryBackend,
//! };
//! use std::sync::Arc;
//!
//! // 1. Describe the resource
//! struct Forecast {
//!     city: String,
//!     options: RequestCacheOptions,
//! }
//!
//! impl CacheableResource for Forecast {
//!     type Payload = Vec<f32>;
//!
//!     fn hash(&self) -> String { self.city.clone() }
//!     fn cache_tags(&self) -> Vec<String> { vec!["forecast".into()] }
//!     fn cache_times(&self) -> CacheTimes { CacheTimes::from_secs(3600, 600, 60) }
//!     fn cache_options(&self) -> RequestCacheOptions { self.options.clone() }
//!
//!     async fn compute(&self) -> refresh_kit::Result<Vec<f32>> {
//!         fetch_forecast(&self.city).await
//!     }
//! }
//!
//! // 2. Create the service (Clone, share it across handlers)
//! let cache = CacheService::new(InMemoryBackend::new());
//!
//! // 3. Serve
//! let request = Arc::new(Forecast {
//!     city: "oslo".into(),
//!     options: "max-age=300".parse()?,
//! });
//! if let Some(entry) = cache.get(&request).await? {
//!     println!("{:?} (expires in {}s)", entry.payload(), entry.expires_in());
//! }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod flight;
pub mod key;
pub mod observability;
pub mod options;
pub mod orchestrator;
pub mod policy;
pub mod resource;
pub mod serialization;
pub mod service;
pub mod store;
pub mod times;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use dispatch::{ChannelDispatcher, RefreshDispatcher, RefreshJob, RefreshWorker, TokioDispatcher};
pub use entry::{CacheEntry, CacheMeta};
pub use error::{Error, Result};
pub use key::ScopedKey;
pub use observability::CacheMetrics;
pub use options::RequestCacheOptions;
pub use orchestrator::RefreshOrchestrator;
pub use policy::Freshness;
pub use resource::CacheableResource;
pub use service::{CacheService, CacheServiceBuilder};
pub use times::CacheTimes;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
