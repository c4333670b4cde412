//! Per-key single-flight leases.
//!
//! A caller about to recompute takes the key's lease. Concurrent callers for
//! the same key queue on it; when they get it they know someone else has just
//! been computing ([`Lease::waited`]) and can look in the store first instead
//! of hitting the producer again.
//!
//! Leases live in an in-process map and are removed when the last holder or
//! waiter lets go.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Registry of in-flight recomputes, keyed by storage key.
#[derive(Clone, Default)]
pub struct SingleFlight {
    slots: Arc<DashMap<String, Slot>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `key`, waiting for the current holder if any.
    pub async fn acquire(&self, key: &str) -> Lease {
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let (guard, waited) = match slot.clone().try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => {
                trace!("Waiting on in-flight recompute for {}", key);
                (slot.clone().lock_owned().await, true)
            }
        };

        Lease {
            key: key.to_string(),
            guard: Some(guard),
            slot: Some(slot),
            slots: Arc::clone(&self.slots),
            waited,
        }
    }

    /// Whether anyone holds or waits on the lease for `key`.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of keys with a live lease or waiter.
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }
}

/// Exclusive right to recompute one key.
pub struct Lease {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    slot: Option<Slot>,
    slots: Arc<DashMap<String, Slot>>,
    waited: bool,
}

impl Lease {
    /// True if another caller held the lease when this one asked for it.
    pub fn waited(&self) -> bool {
        self.waited
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.guard.take();
        self.slot.take();
        // only the map's own handle left: nobody holds or waits on this key
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
