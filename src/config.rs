//! Process-wide cache configuration.

use crate::error::{Error, Result};

/// Environment variable holding the application name used as namespace tag.
pub const NAMESPACE_ENV: &str = "APP_NAME";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "app";

/// Configuration injected into the cache at construction.
///
/// The namespace tag is mixed into every key so that several applications
/// can share one store. It is read once, here, and never per call.
///
/// ```
/// use refresh_kit::CacheConfig;
///
/// let config = CacheConfig::new("weather-api").with_single_flight(false);
/// assert_eq!(config.namespace(), "weather-api");
/// assert!(!config.single_flight());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    namespace: String,
    single_flight: bool,
}

impl CacheConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        CacheConfig {
            namespace: namespace.into(),
            single_flight: true,
        }
    }

    /// Read the namespace from `APP_NAME`, falling back to `"app"`.
    pub fn from_env() -> Self {
        match std::env::var(NAMESPACE_ENV) {
            Ok(name) if !name.trim().is_empty() => Self::new(name.trim()),
            _ => {
                debug!("{} not set, using namespace '{}'", NAMESPACE_ENV, DEFAULT_NAMESPACE);
                Self::new(DEFAULT_NAMESPACE)
            }
        }
    }

    /// Enable or disable the in-process single-flight guard. Enabled by default.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn single_flight(&self) -> bool {
        self.single_flight
    }

    /// # Errors
    ///
    /// `Error::ConfigError` if the namespace is empty or contains a key separator.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::ConfigError("Namespace must not be empty".to_string()));
        }
        if self.namespace.contains(['|', ':']) {
            return Err(Error::ConfigError(format!(
                "Namespace '{}' must not contain '|' or ':'",
                self.namespace
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
