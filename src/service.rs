//! High-level cache service for web applications.
//!
//! Provides a convenient wrapper around [`RefreshOrchestrator`] with Arc for
//! easy sharing.

use crate::backend::CacheBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::dispatch::{RefreshDispatcher, TokioDispatcher};
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::orchestrator::RefreshOrchestrator;
use crate::resource::CacheableResource;
use std::sync::Arc;

/// High-level cache service for web applications.
///
/// Wraps `RefreshOrchestrator` in `Arc` for easy sharing across threads and
/// tasks. Cloning is an `Arc` increment; every clone serves from the same
/// store and dispatches through the same runner.
///
/// # Example
///
/// ```ignore
/// use refresh_kit::{CacheService, CacheConfig, backend::InMemoryBackend};
/// use std::sync::Arc;
///
/// let cache = CacheService::builder(InMemoryBackend::new())
///     .with_config(CacheConfig::from_env())
///     .build()?;
///
/// pub struct ForecastHandler {
///     cache: CacheService<InMemoryBackend>,
/// }
///
/// impl ForecastHandler {
///     pub async fn handle(&self, city: &str, header: &str) -> Result<Option<Forecast>> {
///         let request = Arc::new(ForecastRequest::new(city, header.parse()?));
///         let entry = self.cache.get(&request).await?;
///         Ok(entry.map(|e| e.into_payload()))
///     }
/// }
/// ```
pub struct CacheService<B: CacheBackend, D: RefreshDispatcher = TokioDispatcher> {
    orchestrator: Arc<RefreshOrchestrator<B, D>>,
}

impl<B: CacheBackend, D: RefreshDispatcher> Clone for CacheService<B, D> {
    fn clone(&self) -> Self {
        CacheService {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<B: CacheBackend> CacheService<B, TokioDispatcher> {
    /// Create a new cache service with the given backend and default
    /// configuration.
    pub fn new(backend: B) -> Self {
        CacheService::from_orchestrator(RefreshOrchestrator::new(backend))
    }

    /// Start configuring a service over `backend`.
    pub fn builder(backend: B) -> CacheServiceBuilder<B, TokioDispatcher> {
        CacheServiceBuilder {
            backend,
            dispatcher: TokioDispatcher::new(),
            config: CacheConfig::default(),
            clock: Arc::new(SystemClock),
            metrics: Box::new(NoOpMetrics),
        }
    }
}

impl<B: CacheBackend, D: RefreshDispatcher> CacheService<B, D> {
    pub fn from_orchestrator(orchestrator: RefreshOrchestrator<B, D>) -> Self {
        CacheService {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Serve a resource through the cache.
    ///
    /// See [`RefreshOrchestrator::get`].
    ///
    /// # Errors
    ///
    /// The resource's `compute` failure.
    pub async fn get<R: CacheableResource>(
        &self,
        resource: &Arc<R>,
    ) -> Result<Option<CacheEntry<R::Payload>>> {
        self.orchestrator.get(resource).await
    }

    /// Recompute on the calling path.
    ///
    /// Looks the resource up first (unless its options disable the cache) so
    /// the throttle window and `only-if-cached` can be honored. With
    /// `ignore_cache` the resource is always recomputed.
    ///
    /// # Errors
    ///
    /// The resource's `compute` failure.
    pub async fn get_from_database<R: CacheableResource>(
        &self,
        resource: &R,
        ignore_cache: bool,
    ) -> Result<Option<CacheEntry<R::Payload>>> {
        let cached = if resource.cache_options().use_cache && !ignore_cache {
            let key = self.orchestrator.store().key_for(resource);
            self.orchestrator.store().lookup(&key).await
        } else {
            None
        };

        self.orchestrator
            .get_from_database(resource, cached, ignore_cache)
            .await
    }

    /// Write `payload` for `resource` as a brand new entry.
    ///
    /// # Errors
    ///
    /// `Error::BackendError` / `Error::SerializationError` if the write fails.
    pub async fn update_cache<R: CacheableResource>(
        &self,
        resource: &R,
        payload: R::Payload,
    ) -> Result<CacheEntry<R::Payload>> {
        let entry = CacheEntry::new(payload, self.orchestrator.now(), &resource.cache_times());
        self.orchestrator.update_cache(resource, entry).await
    }

    /// Get a reference to the underlying orchestrator.
    pub fn orchestrator(&self) -> &Arc<RefreshOrchestrator<B, D>> {
        &self.orchestrator
    }
}

/// Builder for [`CacheService`].
pub struct CacheServiceBuilder<B: CacheBackend, D: RefreshDispatcher> {
    backend: B,
    dispatcher: D,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    metrics: Box<dyn CacheMetrics>,
}

impl<B: CacheBackend, D: RefreshDispatcher> CacheServiceBuilder<B, D> {
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the refresh dispatcher.
    pub fn with_dispatcher<D2: RefreshDispatcher>(self, dispatcher: D2) -> CacheServiceBuilder<B, D2> {
        CacheServiceBuilder {
            backend: self.backend,
            dispatcher,
            config: self.config,
            clock: self.clock,
            metrics: self.metrics,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// # Errors
    ///
    /// `Error::ConfigError` if the configuration does not validate.
    pub fn build(self) -> Result<CacheService<B, D>> {
        self.config.validate()?;

        let orchestrator = RefreshOrchestrator::with_parts(self.backend, self.dispatcher, self.config)
            .with_clock(self.clock)
            .with_metrics(self.metrics);

        Ok(CacheService::from_orchestrator(orchestrator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::options::RequestCacheOptions;
    use crate::times::CacheTimes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Station {
        id: String,
        reads: AtomicUsize,
        options: RequestCacheOptions,
    }

    impl Station {
        fn new(id: &str) -> Self {
            Station {
                id: id.to_string(),
                reads: AtomicUsize::new(0),
                options: RequestCacheOptions::default(),
            }
        }
    }

    impl CacheableResource for Station {
        type Payload = String;

        fn hash(&self) -> String {
            self.id.clone()
        }

        fn cache_tags(&self) -> Vec<String> {
            vec!["stations".to_string()]
        }

        fn cache_times(&self) -> CacheTimes {
            CacheTimes::from_secs(60, 10, 30)
        }

        fn cache_options(&self) -> RequestCacheOptions {
            self.options.clone()
        }

        async fn compute(&self) -> Result<String> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}#{}", self.id, n))
        }
    }

    fn service(clock: &ManualClock) -> CacheService<InMemoryBackend> {
        CacheService::builder(InMemoryBackend::new())
            .with_config(CacheConfig::new("svc"))
            .with_clock(Arc::new(clock.clone()))
            .build()
            .expect("Failed to build")
    }

    #[test]
    fn test_cache_service_creation() {
        let backend = InMemoryBackend::new();
        let _service = CacheService::new(backend);
    }

    #[test]
    fn test_builder_rejects_bad_namespace() {
        let result = CacheService::builder(InMemoryBackend::new())
            .with_config(CacheConfig::new("a|b"))
            .build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_cache_service_clone() {
        let service1 = CacheService::new(InMemoryBackend::new());
        let service2 = service1.clone();

        assert!(Arc::ptr_eq(service1.orchestrator(), service2.orchestrator()));
    }

    #[tokio::test]
    async fn test_get_from_database_honors_throttle() {
        let clock = ManualClock::new();
        let service = service(&clock);
        let station = Station::new("oslo");

        let first = service
            .get_from_database(&station, false)
            .await
            .expect("Failed to compute")
            .expect("Entry missing");
        clock.advance(Duration::from_secs(10));
        let second = service
            .get_from_database(&station, false)
            .await
            .expect("Failed to compute")
            .expect("Entry missing");

        assert_eq!(station.reads.load(Ordering::SeqCst), 1);
        assert_eq!(first.payload(), second.payload());
        assert!(second.from_cache());
    }

    #[tokio::test]
    async fn test_get_from_database_ignore_cache_always_computes() {
        let clock = ManualClock::new();
        let service = service(&clock);
        let station = Station::new("oslo");

        service.get_from_database(&station, true).await.expect("Failed");
        let entry = service
            .get_from_database(&station, true)
            .await
            .expect("Failed")
            .expect("Entry missing");

        assert_eq!(entry.payload(), "oslo#2");
        assert_eq!(station.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_cache_is_served_fresh() {
        let clock = ManualClock::new();
        let service = service(&clock);
        let station = Arc::new(Station::new("bergen"));

        service
            .update_cache(station.as_ref(), "manual".to_string())
            .await
            .expect("Failed to update");

        let entry = service
            .get(&station)
            .await
            .expect("Failed to get")
            .expect("Entry missing");
        assert_eq!(entry.payload(), "manual");
        assert!(entry.from_cache());
        assert_eq!(entry.age(clock.now()), Duration::ZERO);
        assert_eq!(station.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_service_thread_safety() {
        let service = CacheService::new(InMemoryBackend::new());
        let mut handles = vec![];

        for i in 0..5 {
            let service_clone = service.clone();
            handles.push(tokio::spawn(async move {
                let station = Arc::new(Station::new(&format!("s{}", i)));
                let entry = service_clone
                    .get(&station)
                    .await
                    .expect("Failed to get")
                    .expect("Entry missing");
                assert_eq!(entry.payload(), &format!("s{}#1", i));
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }
    }
}
