//! Freshness classification for cached entries.
//!
//! Given a possibly absent entry, the request's directives and the resource's
//! timing thresholds, [`classify`] decides what the orchestrator does next.
//!
//! # Decision order
//!
//! ```text
//! use_cache == false or no entry   → Bypass          (recompute)
//! max_age set and age > max_age    → ForcedExpire    (recompute, throttle skipped)
//! age >= expiration_time           → Expired         (recompute, throttle skipped)
//! age <  update_time               → Fresh           (serve)
//! queued_at absent                 → NeedsRefresh    (serve + dispatch refresh)
//! queued_at present                → AlreadyQueued   (serve)
//! ```
//!
//! Each threshold is compared on its own; nothing assumes
//! `min_database_refresh_time <= update_time <= expiration_time`.
//!
//! # When each outcome occurs
//!
//! | Outcome | Returns | Side effect |
//! |---------|---------|-------------|
//! | `Bypass` | recomputed entry (or nothing, under `only-if-cached`) | store write |
//! | `ForcedExpire` / `Expired` | recomputed entry | store write |
//! | `Fresh` | cached entry | none |
//! | `NeedsRefresh` | cached entry | background refresh |
//! | `AlreadyQueued` | cached entry | none |

use crate::entry::CacheEntry;
use crate::options::RequestCacheOptions;
use crate::times::CacheTimes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Outcome of the freshness decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Cache disabled for this request, or nothing cached.
    Bypass,

    /// Entry older than the request's `max-age`.
    ForcedExpire,

    /// Entry past `expiration_time` although the store still returned it.
    Expired,

    /// Entry younger than `update_time`.
    Fresh,

    /// Entry due for a background refresh, none dispatched yet.
    NeedsRefresh,

    /// Entry due for a refresh that was already dispatched.
    AlreadyQueued,
}

impl Freshness {
    /// Whether the caller must wait for a synchronous recompute.
    pub fn requires_recompute(self) -> bool {
        matches!(
            self,
            Freshness::Bypass | Freshness::ForcedExpire | Freshness::Expired
        )
    }

    /// Whether the cached entry is served as-is.
    pub fn serves_cached(self) -> bool {
        !self.requires_recompute()
    }

    /// Whether the throttle window may refuse a recompute. An entry that is
    /// too old to serve is treated as absent, so nothing protects it.
    pub fn honors_throttle(self) -> bool {
        !matches!(self, Freshness::ForcedExpire | Freshness::Expired)
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Bypass => write!(f, "Bypass"),
            Freshness::ForcedExpire => write!(f, "ForcedExpire"),
            Freshness::Expired => write!(f, "Expired"),
            Freshness::Fresh => write!(f, "Fresh"),
            Freshness::NeedsRefresh => write!(f, "NeedsRefresh"),
            Freshness::AlreadyQueued => write!(f, "AlreadyQueued"),
        }
    }
}

/// Classify an entry at `now`.
pub fn classify<T>(
    entry: Option<&CacheEntry<T>>,
    options: &RequestCacheOptions,
    times: &CacheTimes,
    now: DateTime<Utc>,
) -> Freshness {
    let entry = match entry {
        Some(entry) if options.use_cache => entry,
        _ => return Freshness::Bypass,
    };

    let age = entry.age(now);

    if options.effective_max_age().is_some_and(|max_age| age > max_age) {
        return Freshness::ForcedExpire;
    }

    if age >= times.expiration_time {
        return Freshness::Expired;
    }

    if age < times.update_time {
        return Freshness::Fresh;
    }

    if entry.is_queued() {
        Freshness::AlreadyQueued
    } else {
        Freshness::NeedsRefresh
    }
}

/// Whether an existing entry is still inside the throttle window.
pub fn within_throttle<T>(entry: &CacheEntry<T>, times: &CacheTimes, now: DateTime<Utc>) -> bool {
    entry.age(now) < times.min_database_refresh_time
}

/// Whether a served entry should trigger a background refresh.
pub fn ready_to_queue<T>(entry: &CacheEntry<T>, times: &CacheTimes, now: DateTime<Utc>) -> bool {
    entry.age(now) >= times.update_time && !entry.is_queued()
}

/// Lifetime left before `expiration_time`, used as TTL for marker writes.
pub fn remaining_ttl<T>(
    entry: &CacheEntry<T>,
    times: &CacheTimes,
    now: DateTime<Utc>,
) -> Option<Duration> {
    times
        .expiration_time
        .checked_sub(entry.age(now))
        .filter(|left| !left.is_zero())
}
