//! Per-request cache directives.
//!
//! [`RequestCacheOptions`] carries what a caller asks of the cache for one
//! request. The defaults are permissive: read from the cache, no age limit,
//! recompute when needed and store the result.
//!
//! The options can be parsed from a Cache-Control style header value:
//!
//! | Directive | Effect |
//! |-----------|--------|
//! | `no-cache` | `use_cache = false`, skip the read path |
//! | `max-age=N` | treat entries older than `N` seconds as a miss |
//! | `only-if-cached` | never recompute because of the throttle window |
//! | `no-store` | do not write a recomputed entry back |
//!
//! ```
//! use refresh_kit::RequestCacheOptions;
//! use std::time::Duration;
//!
//! let options: RequestCacheOptions = "max-age=5, no-store".parse().unwrap();
//! assert_eq!(options.max_age, Some(Duration::from_secs(5)));
//! assert!(options.no_store);
//! assert!(options.use_cache);
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Directives controlling cache use for a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestCacheOptions {
    /// When false the cache read path is skipped entirely.
    pub use_cache: bool,

    /// Entries older than this are recomputed synchronously. `None` or zero
    /// means no limit.
    pub max_age: Option<Duration>,

    /// Return whatever is cached (possibly nothing) instead of recomputing
    /// inside the throttle window.
    pub only_if_cached: bool,

    /// Do not write a recomputed entry back to the store.
    pub no_store: bool,
}

impl Default for RequestCacheOptions {
    fn default() -> Self {
        RequestCacheOptions {
            use_cache: true,
            max_age: None,
            only_if_cached: false,
            no_store: false,
        }
    }
}

impl RequestCacheOptions {
    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_only_if_cached(mut self, only_if_cached: bool) -> Self {
        self.only_if_cached = only_if_cached;
        self
    }

    pub fn with_no_store(mut self, no_store: bool) -> Self {
        self.no_store = no_store;
        self
    }

    /// The age limit, if one is actually in force.
    pub fn effective_max_age(&self) -> Option<Duration> {
        self.max_age.filter(|age| !age.is_zero())
    }
}

impl FromStr for RequestCacheOptions {
    type Err = Error;

    fn from_str(header: &str) -> Result<Self> {
        let mut options = RequestCacheOptions::default();

        for directive in header.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let (name, value) = match directive.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (directive, None),
            };

            match name.to_ascii_lowercase().as_str() {
                "no-cache" => options.use_cache = false,
                "only-if-cached" => options.only_if_cached = true,
                "no-store" => options.no_store = true,
                "max-age" => {
                    let raw = value.ok_or_else(|| {
                        Error::ConfigError("max-age directive without a value".to_string())
                    })?;
                    let secs: u64 = raw.parse().map_err(|_| {
                        Error::ConfigError(format!("Invalid max-age value: {}", raw))
                    })?;
                    options.max_age = Some(Duration::from_secs(secs));
                }
                other => trace!("Ignoring unknown cache directive: {}", other),
            }
        }

        Ok(options)
    }
}

impl fmt::Display for RequestCacheOptions {
    /// Canonical header form. Defaults render as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut directives = Vec::new();
        if !self.use_cache {
            directives.push("no-cache".to_string());
        }
        if let Some(age) = self.effective_max_age() {
            directives.push(format!("max-age={}", age.as_secs()));
        }
        if self.only_if_cached {
            directives.push("only-if-cached".to_string());
        }
        if self.no_store {
            directives.push("no-store".to_string());
        }
        write!(f, "{}", directives.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_permissive() {
        let options = RequestCacheOptions::default();
        assert!(options.use_cache);
        assert_eq!(options.max_age, None);
        assert!(!options.only_if_cached);
        assert!(!options.no_store);
    }

    #[test]
    fn test_parse_all_directives() {
        let options: RequestCacheOptions = "no-cache, max-age=30, only-if-cached, no-store"
            .parse()
            .expect("Failed to parse");

        assert!(!options.use_cache);
        assert_eq!(options.max_age, Some(Duration::from_secs(30)));
        assert!(options.only_if_cached);
        assert!(options.no_store);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_skips_unknown() {
        let options: RequestCacheOptions = "Max-Age=\"12\", private, NO-STORE"
            .parse()
            .expect("Failed to parse");

        assert_eq!(options.max_age, Some(Duration::from_secs(12)));
        assert!(options.no_store);
        assert!(options.use_cache);
    }

    #[test]
    fn test_parse_rejects_bad_max_age() {
        let result: Result<RequestCacheOptions> = "max-age=soon".parse();
        assert!(matches!(result, Err(Error::ConfigError(_))));

        let result: Result<RequestCacheOptions> = "max-age".parse();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_parse_empty_header() {
        let options: RequestCacheOptions = "".parse().expect("Failed to parse");
        assert_eq!(options, RequestCacheOptions::default());
    }

    #[test]
    fn test_zero_max_age_is_unset() {
        let options = RequestCacheOptions::default().with_max_age(Duration::ZERO);
        assert_eq!(options.effective_max_age(), None);
    }

    #[test]
    fn test_display_renders_header() {
        let options = RequestCacheOptions::default()
            .with_max_age(Duration::from_secs(5))
            .with_no_store(true);
        assert_eq!(options.to_string(), "max-age=5, no-store");
        assert_eq!(RequestCacheOptions::default().to_string(), "");
    }
}
