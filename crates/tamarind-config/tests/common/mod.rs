//! Common test utilities for repository integration tests
//!
//! This module provides:
//! - `TestStore`: in-memory document store with fault injection and call counting
//! - `FailingCache`: cache client whose every call errors
//! - `RecordingBroker` / `FailingBroker`: broker doubles
//! - `Harness`: a repository wired to the doubles above

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tamarind_common::{BrokerError, CacheError, StoreError};
use tamarind_config::{
    AuditPipeline, AuditSettings, AuditWorkers, CacheLayer, ConfigIn, ConfigRepository,
    RepositorySettings, RequestDetails,
};
use tamarind_persistence::{
    BrokerClient, CacheClient, ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord,
    DocumentStore, HeadUpdate, MemoryDocumentStore, MokaCacheClient, Payload, UpdateOutcome,
};
use tokio::sync::Barrier;

/// Memory store wrapper with fault injection
#[derive(Default)]
pub struct TestStore {
    pub inner: MemoryDocumentStore,
    pub find_one_calls: AtomicUsize,
    pub fail_version_append: AtomicBool,
    pub fail_head_update: AtomicBool,
    /// Every `find_one` waits here after reading, before returning
    pub find_barrier: Option<Barrier>,
    /// Every `find_one` sleeps this long before reading
    pub find_delay: Option<Duration>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_find_barrier(parties: usize) -> Self {
        Self {
            find_barrier: Some(Barrier::new(parties)),
            ..Self::default()
        }
    }

    pub fn with_find_delay(delay: Duration) -> Self {
        Self {
            find_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn find_calls(&self) -> usize {
        self.find_one_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for TestStore {
    async fn find_one(&self, filter: &ConfigFilter) -> Result<Option<ConfigDocument>, StoreError> {
        self.find_one_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.find_delay {
            tokio::time::sleep(delay).await;
        }
        let found = self.inner.find_one(filter).await;
        if let Some(barrier) = &self.find_barrier {
            barrier.wait().await;
        }
        found
    }

    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<ConfigSummary>, StoreError> {
        self.inner.find_page(offset, limit).await
    }

    async fn insert_version(&self, record: &ConfigVersionRecord) -> Result<String, StoreError> {
        if self.fail_version_append.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("version append rejected".to_string()));
        }
        self.inner.insert_version(record).await
    }

    async fn update_one(
        &self,
        filter: &ConfigFilter,
        update: HeadUpdate,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        if self.fail_head_update.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("head update rejected".to_string()));
        }
        self.inner.update_one(filter, update, upsert).await
    }

    async fn find_versions(
        &self,
        config_id: &str,
    ) -> Result<Vec<ConfigVersionRecord>, StoreError> {
        self.inner.find_versions(config_id).await
    }
}

/// Cache whose backend is always unreachable
pub struct FailingCache;

#[async_trait]
impl CacheClient for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingBroker {
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl BrokerClient for RecordingBroker {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.messages.lock().push((topic.to_string(), payload));
        Ok(())
    }
}

pub struct FailingBroker;

#[async_trait]
impl BrokerClient for FailingBroker {
    async fn produce(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), BrokerError> {
        Err(BrokerError::Unavailable("broker down".to_string()))
    }
}

/// Cache configuration for a harness
pub enum CacheMode {
    Disabled,
    Moka,
    Failing,
}

/// Repository wired to test doubles
pub struct Harness {
    pub repo: ConfigRepository,
    pub store: Arc<TestStore>,
    pub cache: Option<Arc<MokaCacheClient>>,
    pub workers: Option<AuditWorkers>,
}

impl Harness {
    pub fn new(store: TestStore, cache: CacheMode) -> Self {
        Self::build(store, cache, AuditPipeline::disabled(), None)
    }

    pub fn with_broker(store: TestStore, cache: CacheMode, broker: Arc<dyn BrokerClient>) -> Self {
        let (pipeline, workers) = AuditPipeline::start(broker, AuditSettings::default());
        Self::build(store, cache, pipeline, Some(workers))
    }

    fn build(
        store: TestStore,
        cache: CacheMode,
        audit: AuditPipeline,
        workers: Option<AuditWorkers>,
    ) -> Self {
        let store = Arc::new(store);
        let (layer, moka) = match cache {
            CacheMode::Disabled => (CacheLayer::disabled(), None),
            CacheMode::Moka => {
                let moka = Arc::new(MokaCacheClient::new(1_000));
                (CacheLayer::enabled(moka.clone()), Some(moka))
            }
            CacheMode::Failing => (CacheLayer::enabled(Arc::new(FailingCache)), None),
        };
        let repo = ConfigRepository::new(
            store.clone(),
            layer,
            audit,
            RepositorySettings {
                operation_timeout: Duration::from_secs(1),
            },
        );
        Self {
            repo,
            store,
            cache: moka,
            workers,
        }
    }
}

pub fn payload(url: &str) -> Payload {
    let mut p = Payload::new();
    p.insert("url".to_string(), json!(url));
    p
}

pub fn config_in(name: &str, owner: &str, url: &str) -> ConfigIn {
    ConfigIn {
        config_name: name.to_string(),
        owner: owner.to_string(),
        config: payload(url),
        parents: vec![],
    }
}

pub fn details() -> RequestDetails {
    RequestDetails::new().with("request.method", "TEST")
}
