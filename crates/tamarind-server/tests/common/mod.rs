//! Common test utilities for HTTP route tests
//!
//! - `RecordingBroker`: keeps every produced audit message
//! - `TestContext`: application state over the in-memory backends
//! - request helpers for authenticated calls

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::{test::TestRequest, web};
use async_trait::async_trait;
use parking_lot::Mutex;
use prost::Message;
use tamarind_auth::{AuthProvider, HostCredentials, MemoryAuthProvider};
use tamarind_common::BrokerError;
use tamarind_config::{
    AuditLog, AuditPipeline, AuditSettings, AuditWorkers, CacheLayer, ConfigRepository,
    RepositorySettings,
};
use tamarind_persistence::{BrokerClient, MemoryDocumentStore, MokaCacheClient};
use tamarind_server::{api::auth::HOST_ID_HEADER, model::AppState};

#[derive(Default)]
pub struct RecordingBroker {
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingBroker {
    /// Operation names of every received message, sorted
    pub fn operations(&self) -> Vec<String> {
        let mut ops: Vec<String> = self
            .messages
            .lock()
            .iter()
            .map(|(_, bytes)| AuditLog::decode(bytes.as_slice()).unwrap().func_name)
            .collect();
        ops.sort();
        ops
    }
}

#[async_trait]
impl BrokerClient for RecordingBroker {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.messages.lock().push((topic.to_string(), payload));
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub broker: Arc<RecordingBroker>,
    pub workers: AuditWorkers,
}

impl TestContext {
    pub fn new() -> Self {
        let broker = Arc::new(RecordingBroker::default());
        let (audit, workers) = AuditPipeline::start(broker.clone(), AuditSettings::default());
        let repository = ConfigRepository::new(
            Arc::new(MemoryDocumentStore::new()),
            CacheLayer::enabled(Arc::new(MokaCacheClient::new(1_000))),
            audit,
            RepositorySettings {
                operation_timeout: Duration::from_secs(5),
            },
        );
        let auth: Arc<dyn AuthProvider> = Arc::new(MemoryAuthProvider::new());

        Self {
            state: web::Data::new(AppState::new(repository, auth)),
            broker,
            workers,
        }
    }

    /// Register a host directly through the provider
    pub async fn host(&self, name: &str) -> HostCredentials {
        self.state.auth.generate_api_key(name, &[]).await.unwrap()
    }
}

/// Attach bearer credentials to a request
pub fn authed(req: TestRequest, creds: &HostCredentials) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", creds.api_key)))
        .insert_header((HOST_ID_HEADER, creds.host_id.clone()))
}
