//! The envelope around a cached payload.

use crate::times::CacheTimes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached result.
///
/// `payload`, `cached_at` and `queued_at` are persisted. Everything in
/// [`CacheMeta`] is derived on the read path and never stored.
///
/// `cached_at` is fixed when the entry is built; a refreshed entry is a new
/// value with its own `cached_at` and no `queued_at`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    payload: T,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    cached_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    queued_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    meta: CacheMeta,
}

/// Read-time observability fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheMeta {
    /// Seconds until the entry expires. Negative once past expiration.
    pub expires_in: i64,
    /// Seconds until a background refresh is due. Negative once due.
    pub queue_in: i64,
    /// True iff the entry was read from the store.
    pub from_cache: bool,
    /// Wall-clock cost of the `get` call that produced this value.
    pub built_in: Duration,
}

impl<T> CacheEntry<T> {
    /// Build a freshly computed entry.
    pub fn new(payload: T, cached_at: DateTime<Utc>, times: &CacheTimes) -> Self {
        CacheEntry {
            payload,
            cached_at,
            queued_at: None,
            meta: CacheMeta {
                expires_in: duration_secs(times.expiration_time),
                queue_in: duration_secs(times.update_time),
                from_cache: false,
                built_in: Duration::ZERO,
            },
        }
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn queued_at(&self) -> Option<DateTime<Utc>> {
        self.queued_at
    }

    pub fn is_queued(&self) -> bool {
        self.queued_at.is_some()
    }

    pub fn meta(&self) -> &CacheMeta {
        &self.meta
    }

    pub fn expires_in(&self) -> i64 {
        self.meta.expires_in
    }

    pub fn queue_in(&self) -> i64 {
        self.meta.queue_in
    }

    pub fn from_cache(&self) -> bool {
        self.meta.from_cache
    }

    pub fn built_in(&self) -> Duration {
        self.meta.built_in
    }

    /// Entry age at `now`. Clock skew (a `cached_at` in the future) reads as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Refresh the read-time fields for an entry that came out of the store.
    pub(crate) fn annotate(&mut self, times: &CacheTimes, now: DateTime<Utc>) {
        let age = duration_secs(self.age(now));
        self.meta.expires_in = duration_secs(times.expiration_time) - age;
        self.meta.queue_in = duration_secs(times.update_time) - age;
        self.meta.from_cache = true;
    }

    /// Record that a refresh has been handed to the task runner.
    pub(crate) fn mark_queued(&mut self, at: DateTime<Utc>) {
        if self.queued_at.is_none() {
            self.queued_at = Some(at);
        }
    }

    pub(crate) fn clear_queued(&mut self) {
        self.queued_at = None;
    }

    /// Restamp before an explicit store write.
    pub(crate) fn restamp(&mut self, cached_at: DateTime<Utc>, times: &CacheTimes) {
        self.cached_at = cached_at;
        self.queued_at = None;
        self.meta.expires_in = duration_secs(times.expiration_time);
        self.meta.queue_in = duration_secs(times.update_time);
    }

    /// Flag an entry just read back from the store.
    pub(crate) fn mark_from_cache(&mut self) {
        self.meta.from_cache = true;
    }

    pub(crate) fn set_built_in(&mut self, built_in: Duration) {
        self.meta.built_in = built_in;
    }
}

fn duration_secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}
