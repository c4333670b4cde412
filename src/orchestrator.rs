//! Refresh orchestrator - the read path and both recompute paths.

use crate::backend::CacheBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::dispatch::{RefreshDispatcher, RefreshJob, TokioDispatcher};
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::flight::SingleFlight;
use crate::key::ScopedKey;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::options::RequestCacheOptions;
use crate::policy::{self, Freshness};
use crate::resource::CacheableResource;
use crate::store::TaggedStore;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;

/// Decides, per request, between serving, refreshing in the background and
/// recomputing on the calling path.
///
/// Usually reached through [`CacheService`](crate::CacheService), which owns
/// it behind an `Arc`. The asynchronous path needs that `Arc`: a refresh job
/// keeps the orchestrator alive until it has written its result.
///
/// # Example
///
/// ```ignore
/// use refresh_kit::{RefreshOrchestrator, backend::InMemoryBackend};
/// use std::sync::Arc;
///
/// let orchestrator = Arc::new(RefreshOrchestrator::new(InMemoryBackend::new()));
/// let entry = orchestrator.get(&Arc::new(resource)).await?;
/// ```
pub struct RefreshOrchestrator<B: CacheBackend, D: RefreshDispatcher = TokioDispatcher> {
    store: TaggedStore<B>,
    dispatcher: D,
    flights: Option<SingleFlight>,
    clock: Arc<dyn Clock>,
    metrics: Box<dyn CacheMetrics>,
}

impl<B: CacheBackend> RefreshOrchestrator<B, TokioDispatcher> {
    /// Orchestrator with the default configuration, spawning refreshes on the
    /// current tokio runtime.
    pub fn new(backend: B) -> Self {
        Self::with_parts(backend, TokioDispatcher::new(), CacheConfig::default())
    }
}

impl<B: CacheBackend, D: RefreshDispatcher> RefreshOrchestrator<B, D> {
    pub fn with_parts(backend: B, dispatcher: D, config: CacheConfig) -> Self {
        info!(
            "Initializing refresh orchestrator (namespace: {}, single_flight: {})",
            config.namespace(),
            config.single_flight()
        );

        RefreshOrchestrator {
            store: TaggedStore::new(backend, config.namespace()),
            dispatcher,
            flights: config.single_flight().then(SingleFlight::new),
            clock: Arc::new(SystemClock),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Replace the refresh dispatcher.
    pub fn with_dispatcher<D2: RefreshDispatcher>(self, dispatcher: D2) -> RefreshOrchestrator<B, D2> {
        RefreshOrchestrator {
            store: self.store,
            dispatcher,
            flights: self.flights,
            clock: self.clock,
            metrics: self.metrics,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the wall-clock source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &TaggedStore<B> {
        &self.store
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Serve a resource through the cache.
    ///
    /// Lookup (skipped when `use_cache` is off), classify, then serve,
    /// schedule a background refresh, or recompute. `built_in` is stamped on
    /// whatever comes back.
    ///
    /// Returns `Ok(None)` only under `only-if-cached` with nothing cached.
    ///
    /// # Errors
    ///
    /// Only the resource's own `compute` failure. Store and dispatch failures
    /// are logged and absorbed.
    pub async fn get<R: CacheableResource>(
        self: &Arc<Self>,
        resource: &Arc<R>,
    ) -> Result<Option<CacheEntry<R::Payload>>> {
        let started = Instant::now();
        let now = self.clock.now();
        let options = resource.cache_options();
        let times = resource.cache_times();
        let key = self.store.key_for(resource.as_ref());
        let storage_key = key.storage_key();

        if !times.is_ordered() {
            warn!("Cache times for {} are out of order ({})", key, times);
        }

        let cached: Option<CacheEntry<R::Payload>> = if options.use_cache {
            self.store.lookup(&key).await
        } else {
            None
        };

        let decision = policy::classify(cached.as_ref(), &options, &times, now);
        debug!("» {} classified as {}", key, decision);

        let result = if decision.requires_recompute() {
            self.metrics.record_miss(&storage_key);
            match self
                .synchronous(resource.as_ref(), &key, cached, decision, now)
                .await
            {
                // cache-sourced despite the recompute: kept by only-if-cached
                // or written by a concurrent leader, and may be due for a refresh
                Ok(Some(entry)) if entry.from_cache() => {
                    Ok(Some(self.serve(resource, &key, entry, now).await))
                }
                other => other,
            }
        } else {
            match cached {
                Some(entry) => Ok(Some(self.serve(resource, &key, entry, now).await)),
                None => Ok(None),
            }
        };

        match result {
            Ok(mut entry) => {
                if let Some(entry) = entry.as_mut() {
                    entry.set_built_in(started.elapsed());
                }
                Ok(entry)
            }
            Err(e) => {
                self.metrics.record_error(&storage_key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Synchronous recompute with the throttle guard.
    ///
    /// Unless `ignore_cache` is set, `cached` is returned unchanged (possibly
    /// `None`) when the request is `only-if-cached`, or when `cached` is
    /// younger than `min_database_refresh_time` and not past `max-age` or
    /// `expiration_time`. Otherwise the resource is computed, stored (unless
    /// `no-store`) and returned.
    ///
    /// With `ignore_cache` the resource is always computed, even if another
    /// caller just did.
    ///
    /// # Errors
    ///
    /// The resource's `compute` failure.
    pub async fn get_from_database<R: CacheableResource>(
        &self,
        resource: &R,
        cached: Option<CacheEntry<R::Payload>>,
        ignore_cache: bool,
    ) -> Result<Option<CacheEntry<R::Payload>>> {
        let now = self.clock.now();
        let key = self.store.key_for(resource);
        let times = resource.cache_times();
        let cached = cached.map(|mut entry| {
            entry.annotate(&times, now);
            entry
        });

        if ignore_cache {
            return self
                .recompute(resource, &key, cached.as_ref(), Trigger::Forced, now)
                .await
                .map(Some);
        }

        let decision = policy::classify(cached.as_ref(), &resource.cache_options(), &times, now);
        self.synchronous(resource, &key, cached, decision, now).await
    }

    /// Restamp `entry` with the current time and write it, replacing whatever
    /// is stored for the resource.
    ///
    /// # Errors
    ///
    /// `Error::BackendError` / `Error::SerializationError` if the write fails.
    /// This is the one place a store failure is reported, since the caller
    /// asked for the write explicitly.
    pub async fn update_cache<R: CacheableResource>(
        &self,
        resource: &R,
        mut entry: CacheEntry<R::Payload>,
    ) -> Result<CacheEntry<R::Payload>> {
        let times = resource.cache_times();
        let key = self.store.key_for(resource);

        entry.restamp(self.clock.now(), &times);
        self.store
            .try_store(&key, &entry, times.expiration_time)
            .await?;
        debug!("Cache updated for {}", key);
        Ok(entry)
    }

    /// Throttle guard, then recompute.
    async fn synchronous<R: CacheableResource>(
        &self,
        resource: &R,
        key: &ScopedKey,
        cached: Option<CacheEntry<R::Payload>>,
        decision: Freshness,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry<R::Payload>>> {
        let options = resource.cache_options();
        let times = resource.cache_times();

        let throttled = options.only_if_cached
            || (decision.honors_throttle()
                && cached
                    .as_ref()
                    .is_some_and(|entry| policy::within_throttle(entry, &times, now)));

        if throttled {
            self.metrics.record_throttled(&key.storage_key());
            debug!(
                "Recompute of {} refused (only_if_cached: {}), returning cached entry",
                key, options.only_if_cached
            );
            return Ok(cached.map(|mut entry| {
                entry.annotate(&times, now);
                entry
            }));
        }

        self.recompute(resource, key, cached.as_ref(), Trigger::Request, now)
            .await
            .map(Some)
    }

    /// Body of a background refresh job: recompute and commit, whatever the
    /// triggering request's directives were.
    async fn refresh<R: CacheableResource>(
        &self,
        resource: &R,
        stale: CacheEntry<R::Payload>,
    ) -> Result<()> {
        let now = self.clock.now();
        let key = self.store.key_for(resource);

        self.recompute(resource, &key, Some(&stale), Trigger::Refresh, now)
            .await
            .map(|_| ())
    }

    /// Compute, build and store a new entry, under the key's lease when
    /// single-flight is on.
    ///
    /// A caller that had to wait for the lease reuses the entry the leader
    /// wrote, if it is newer than `previous` and the trigger allows reading
    /// the store.
    async fn recompute<R: CacheableResource>(
        &self,
        resource: &R,
        key: &ScopedKey,
        previous: Option<&CacheEntry<R::Payload>>,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry<R::Payload>> {
        let storage_key = key.storage_key();
        let times = resource.cache_times();
        let options = resource.cache_options();

        let lease = match &self.flights {
            Some(flights) => Some(flights.acquire(&storage_key).await),
            None => None,
        };

        let waited = lease.as_ref().is_some_and(|lease| lease.waited());
        if waited && trigger.reuses_concurrent(&options) {
            if let Some(mut entry) = self.store.lookup::<R::Payload>(key).await {
                let newer = previous.map_or(true, |old| entry.cached_at() > old.cached_at());
                if newer {
                    debug!("Reusing entry computed concurrently for {}", key);
                    entry.annotate(&times, now);
                    return Ok(entry);
                }
            }
        }

        let started = Instant::now();
        let payload = resource.compute().await?;
        self.metrics
            .record_recompute(&storage_key, started.elapsed());
        info!("Recomputed {} in {:?}", key, started.elapsed());

        let entry = CacheEntry::new(payload, now, &times);
        match trigger {
            Trigger::Refresh => {
                self.store
                    .try_store(key, &entry, times.expiration_time)
                    .await?;
                debug!("Background refresh committed {}", key);
            }
            _ if options.no_store => debug!("no-store set, not writing {}", key),
            _ => {
                self.store
                    .store(key, &entry, times.expiration_time)
                    .await;
            }
        }

        drop(lease);
        Ok(entry)
    }

    /// Return a cache-sourced entry, dispatching a background refresh first
    /// if it is due and no recompute of the key is already running.
    async fn serve<R: CacheableResource>(
        self: &Arc<Self>,
        resource: &Arc<R>,
        key: &ScopedKey,
        mut entry: CacheEntry<R::Payload>,
        now: DateTime<Utc>,
    ) -> CacheEntry<R::Payload> {
        let times = resource.cache_times();
        let storage_key = key.storage_key();
        entry.annotate(&times, now);
        self.metrics.record_hit(&storage_key, entry.age(now));

        if policy::ready_to_queue(&entry, &times, now) {
            let in_flight = self
                .flights
                .as_ref()
                .is_some_and(|flights| flights.is_in_flight(&storage_key));
            if in_flight {
                debug!("Recompute of {} in flight, not scheduling a refresh", key);
            } else {
                self.schedule_refresh(resource, key, &mut entry, now).await;
            }
        }
        entry
    }

    /// Stamp `queued_at` into the stored entry, then hand a refresh job to the
    /// dispatcher. A refused dispatch rolls the marker back so the next read
    /// past `update_time` tries again. Never fails the caller.
    async fn schedule_refresh<R: CacheableResource>(
        self: &Arc<Self>,
        resource: &Arc<R>,
        key: &ScopedKey,
        entry: &mut CacheEntry<R::Payload>,
        now: DateTime<Utc>,
    ) {
        let storage_key = key.storage_key();
        let times = resource.cache_times();
        // entry is at or past expiration: nothing left to mark
        let ttl = policy::remaining_ttl(entry, &times, now);

        entry.mark_queued(now);
        if let Some(ttl) = ttl {
            self.store.store(key, entry, ttl).await;
        }

        let orchestrator = Arc::clone(self);
        let job_resource = Arc::clone(resource);
        let stale = entry.clone();
        let job = RefreshJob::new(
            storage_key.clone(),
            async move { orchestrator.refresh(job_resource.as_ref(), stale).await }.boxed(),
        );

        match self.dispatcher.dispatch(job) {
            Ok(()) => {
                self.metrics.record_refresh_dispatched(&storage_key);
                debug!("Background refresh dispatched for {}", key);
            }
            Err(e) => {
                warn!("Refresh dispatch for {} dropped: {}", key, e);
                self.metrics.record_error(&storage_key, &e.to_string());
                entry.clear_queued();
                if let Some(ttl) = ttl {
                    self.store.store(key, entry, ttl).await;
                }
            }
        }
    }
}

/// What asked for a recompute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    /// A request whose directives apply in full.
    Request,
    /// `get_from_database` with `ignore_cache`: always computes.
    Forced,
    /// A background refresh: always commits, ignoring the triggering
    /// request's `no-store`.
    Refresh,
}

impl Trigger {
    fn reuses_concurrent(self, options: &RequestCacheOptions) -> bool {
        match self {
            Trigger::Request => options.use_cache,
            Trigger::Forced => false,
            Trigger::Refresh => true,
        }
    }
}
