//! Cache-aside layer for head documents
//!
//! Owns the cache key layout and the snapshot envelope. Snapshots are the
//! JSON encoding of a `ConfigDocument`, base64-encoded so any string cache
//! can hold them.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use metrics::counter;
use tamarind_common::{CACHE_KEY_PREFIX, CACHE_TTL_SECS, CacheError};
use tamarind_persistence::{CacheClient, ConfigDocument};

/// Fixed time-to-live of every cache entry
pub const CACHE_TTL: Duration = Duration::from_secs(CACHE_TTL_SECS);

/// Compose the cache key for an identifier and optional host
///
/// Host-agnostic keys live under `config_any:` and host-scoped keys under
/// `config_host:`. The host is length-prefixed, so no identifier or host
/// spelling can make two lookups share a key.
pub fn cache_key(identifier: &str, host: Option<&str>) -> String {
    match host {
        Some(host) => format!(
            "{}host:{}:{}:{}",
            CACHE_KEY_PREFIX,
            host.len(),
            host,
            identifier
        ),
        None => format!("{}any:{}", CACHE_KEY_PREFIX, identifier),
    }
}

/// Encode a document into its printable cache snapshot
pub fn encode(doc: &ConfigDocument) -> Result<String, CacheError> {
    let bytes = serde_json::to_vec(doc).map_err(|e| CacheError::Corrupt(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a cache snapshot back into a document
pub fn decode(value: &str) -> Result<ConfigDocument, CacheError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| CacheError::Corrupt(format!("invalid base64: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt(format!("invalid snapshot: {}", e)))
}

/// Cache-aside access to head document snapshots
#[derive(Clone)]
pub struct CacheLayer {
    client: Option<Arc<dyn CacheClient>>,
}

impl CacheLayer {
    pub fn enabled(client: Arc<dyn CacheClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Layer whose every call fails with `CacheError::Disabled`
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// `Ok(None)` is a miss; a miss is never proof the document does not exist
    pub async fn get(&self, key: &str) -> Result<Option<ConfigDocument>, CacheError> {
        let client = self.client.as_ref().ok_or(CacheError::Disabled)?;

        match client.get(key).await? {
            Some(value) => {
                counter!("cache_hits_total", "cache" => "config").increment(1);
                decode(&value).map(Some)
            }
            None => {
                counter!("cache_misses_total", "cache" => "config").increment(1);
                Ok(None)
            }
        }
    }

    pub async fn set(&self, key: &str, doc: &ConfigDocument) -> Result<(), CacheError> {
        let client = self.client.as_ref().ok_or(CacheError::Disabled)?;
        client.set(key, encode(doc)?, CACHE_TTL).await
    }
}
