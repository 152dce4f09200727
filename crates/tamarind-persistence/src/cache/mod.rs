// In-process cache client backed by moka
// Honors the TTL passed to each `set` through a per-entry expiry policy

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tamarind_common::CacheError;

use crate::traits::CacheClient;

/// Cached value together with the TTL it was written with
#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache client over a bounded moka cache
#[derive(Clone)]
pub struct MokaCacheClient {
    cache: Cache<String, CachedValue>,
}

impl MokaCacheClient {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    /// Number of live entries (approximate until pending tasks run)
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether `key` currently holds an unexpired entry
    pub fn contains_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }
}

impl Default for MokaCacheClient {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheClient for MokaCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).await.map(|cached| cached.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), CachedValue { value, ttl })
            .await;
        Ok(())
    }
}
