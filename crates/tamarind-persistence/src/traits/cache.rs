//! Cache client trait

use std::time::Duration;

use async_trait::async_trait;
use tamarind_common::CacheError;

/// Key/value cache with per-entry time-to-live
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// `Ok(None)` is a miss
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}
