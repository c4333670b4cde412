//! Timing thresholds for a cacheable resource type.

use std::fmt;
use std::time::Duration;

/// The three ages that drive the freshness decision.
///
/// The intended order is
/// `min_database_refresh_time <= update_time <= expiration_time`, but nothing
/// enforces it: the policy engine compares each threshold on its own, so a
/// misconfigured resource still gets a well-defined (if odd) behavior.
///
/// ```
/// use refresh_kit::CacheTimes;
/// use std::time::Duration;
///
/// let times = CacheTimes::from_secs(3600, 600, 30);
/// assert!(times.is_ordered());
/// assert_eq!(times.update_time, Duration::from_secs(600));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTimes {
    /// Past this age the entry is unusable and must be recomputed.
    /// Also the TTL handed to the store.
    pub expiration_time: Duration,

    /// From this age on, the entry is served but a background refresh is due.
    pub update_time: Duration,

    /// Below this age a synchronous recompute is refused (throttle window).
    pub min_database_refresh_time: Duration,
}

impl CacheTimes {
    pub fn new(
        expiration_time: Duration,
        update_time: Duration,
        min_database_refresh_time: Duration,
    ) -> Self {
        CacheTimes {
            expiration_time,
            update_time,
            min_database_refresh_time,
        }
    }

    pub fn from_secs(expiration: u64, update: u64, min_database_refresh: u64) -> Self {
        Self::new(
            Duration::from_secs(expiration),
            Duration::from_secs(update),
            Duration::from_secs(min_database_refresh),
        )
    }

    /// Whether `min <= update <= expiration` holds.
    pub fn is_ordered(&self) -> bool {
        self.min_database_refresh_time <= self.update_time
            && self.update_time <= self.expiration_time
    }
}

impl Default for CacheTimes {
    /// One hour expiration, refresh after ten minutes, one minute throttle.
    fn default() -> Self {
        Self::from_secs(3600, 600, 60)
    }
}

impl fmt::Display for CacheTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expiration={}s update={}s min_refresh={}s",
            self.expiration_time.as_secs(),
            self.update_time.as_secs(),
            self.min_database_refresh_time.as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_thresholds() {
        assert!(CacheTimes::from_secs(60, 10, 5).is_ordered());
        assert!(CacheTimes::from_secs(60, 60, 60).is_ordered());
    }

    #[test]
    fn test_out_of_order_thresholds_detected() {
        assert!(!CacheTimes::from_secs(10, 60, 5).is_ordered());
        assert!(!CacheTimes::from_secs(60, 10, 30).is_ordered());
    }

    #[test]
    fn test_display() {
        let times = CacheTimes::from_secs(60, 10, 5);
        assert_eq!(times.to_string(), "expiration=60s update=10s min_refresh=5s");
    }
}
