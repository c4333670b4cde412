//! Error types for the refresh cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the refresh cache.
///
/// Only a few of these ever reach the caller of
/// [`CacheService::get`](crate::CacheService::get): store failures are
/// degraded to a cache miss and dispatch failures are logged. What remains
/// visible is the producer's own failure.
#[derive(Debug, Clone)]
pub enum Error {
    /// Encoding an entry for the store failed.
    SerializationError(String),

    /// Stored bytes could not be decoded into an entry.
    ///
    /// **Recovery:** the entry is evicted and treated as a miss.
    DeserializationError(String),

    /// The key/value store is unavailable or rejected the operation.
    ///
    /// Surfaced only by [`update_cache`](crate::CacheService::update_cache),
    /// which is an explicit write request. Reads degrade to a miss.
    BackendError(String),

    /// The resource's `compute` step failed.
    ///
    /// This is the one error `get` returns. No retries at this layer;
    /// retry policy belongs to the resource.
    ComputeError(String),

    /// The refresh job could not be handed to the task runner.
    ///
    /// Logged and dropped by the orchestrator. The next read past
    /// `update_time` will try again.
    DispatchError(String),

    /// Invalid configuration or request directive.
    ///
    /// Raised by [`CacheConfig::validate`](crate::CacheConfig::validate) and by
    /// the Cache-Control parser for a malformed `max-age`.
    ConfigError(String),

    /// Stored bytes carry a foreign magic header.
    InvalidCacheEntry(String),

    /// Stored entry was written with a different envelope schema.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ComputeError(msg) => write!(f, "Compute error: {}", msg),
            Error::DispatchError(msg) => write!(f, "Dispatch error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        match e {
            postcard::Error::SerializeBufferFull
            | postcard::Error::SerializeSeqLengthUnknown
            | postcard::Error::SerdeSerCustom => Error::SerializationError(e.to_string()),
            _ => Error::DeserializationError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
