//! Postcard encoding of stored entries inside a versioned envelope.
//!
//! Every value written to a backend follows this layout:
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │ POSTCARD CacheEntry<T>           │
//! └─────────────────┴─────────────────┴──────────────────────────────────┘
//!   "RFKT"              u32                payload, cached_at, queued_at
//! ```
//!
//! Only the persisted part of [`CacheEntry`] is encoded; read-time metadata is
//! rebuilt by the policy engine on every read.
//!
//! ```rust
//! use refresh_kit::serialization::{decode_entry, encode_entry};
//! use refresh_kit::{CacheEntry, CacheTimes};
//!
//! # fn main() -> refresh_kit::Result<()> {
//! let entry = CacheEntry::new(vec![1u8, 2, 3], chrono::Utc::now(), &CacheTimes::default());
//! let bytes = encode_entry(&entry)?;
//! let decoded: CacheEntry<Vec<u8>> = decode_entry(&bytes)?;
//! assert_eq!(decoded.payload(), entry.payload());
//! # Ok(())
//! # }
//! ```

use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header identifying entries written by this crate.
pub const CACHE_MAGIC: [u8; 4] = *b"RFKT";

/// Envelope schema version.
///
/// Bump when the persisted layout of [`CacheEntry`] changes. Entries with a
/// different version are evicted on read and recomputed.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned wrapper written around every stored entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode an entry for the store.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the payload cannot be encoded.
pub fn encode_entry<T: Serialize>(entry: &CacheEntry<T>) -> Result<Vec<u8>> {
    postcard::to_allocvec(&CacheEnvelope::new(entry)).map_err(|e| {
        error!("Cache entry serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode an entry read from the store, validating magic and schema version.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: foreign magic header
/// - `Error::VersionMismatch`: entry written by another schema
/// - `Error::DeserializationError`: corrupted payload
pub fn decode_entry<T: DeserializeOwned>(bytes: &[u8]) -> Result<CacheEntry<T>> {
    let envelope: CacheEnvelope<CacheEntry<T>> = postcard::from_bytes(bytes).map_err(|e| {
        debug!("Cache entry deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
