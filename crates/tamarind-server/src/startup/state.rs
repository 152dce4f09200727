//! Wiring of the repository and its collaborators from configuration

use std::sync::Arc;

use anyhow::{Context, anyhow};
use tamarind_auth::{AuthProvider, MemoryAuthProvider, RocksAuthProvider};
use tamarind_config::{
    AuditPipeline, AuditSettings, AuditWorkers, CacheLayer, ConfigRepository, RepositorySettings,
};
use tamarind_persistence::{
    BrokerClient, DocumentStore, LogBroker, MemoryDocumentStore, MokaCacheClient,
    RestProxyBroker, RocksDocumentStore, StorageMode,
};
use tracing::info;

use crate::model::{AppState, Configuration, config::BrokerKind};

/// Open the document store selected by `storage.mode`
pub fn document_store(configuration: &Configuration) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let mode = configuration.storage_mode().map_err(|e| anyhow!(e))?;
    info!("Persistence mode: {}", mode);

    let store: Arc<dyn DocumentStore> = match mode {
        StorageMode::Memory => Arc::new(MemoryDocumentStore::new()),
        StorageMode::RocksDb => {
            let data_dir = configuration.data_dir();
            let store = RocksDocumentStore::open(&data_dir)
                .with_context(|| format!("failed to open RocksDB at {}", data_dir))?;
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Host key provider matching the document store's durability
pub fn auth_provider(configuration: &Configuration) -> anyhow::Result<Arc<dyn AuthProvider>> {
    let mode = configuration.storage_mode().map_err(|e| anyhow!(e))?;
    let provider: Arc<dyn AuthProvider> = match mode {
        StorageMode::Memory => Arc::new(MemoryAuthProvider::new()),
        StorageMode::RocksDb => {
            let host_dir = configuration.host_data_dir();
            let provider = RocksAuthProvider::open(&host_dir)
                .with_context(|| format!("failed to open host keys at {}", host_dir))?;
            Arc::new(provider)
        }
    };
    Ok(provider)
}

pub fn cache_layer(configuration: &Configuration) -> CacheLayer {
    if configuration.cache_enabled() {
        CacheLayer::enabled(Arc::new(MokaCacheClient::new(
            configuration.cache_max_capacity(),
        )))
    } else {
        info!("Config cache disabled");
        CacheLayer::disabled()
    }
}

pub fn broker(configuration: &Configuration) -> anyhow::Result<Arc<dyn BrokerClient>> {
    let kind = configuration.audit_broker().map_err(|e| anyhow!(e))?;
    let broker: Arc<dyn BrokerClient> = match kind {
        BrokerKind::Log => Arc::new(LogBroker),
        BrokerKind::Rest => {
            let endpoint = configuration
                .audit_endpoint()
                .context("audit.endpoint is required for the rest broker")?;
            Arc::new(RestProxyBroker::new(
                endpoint,
                configuration.audit_broker_timeout(),
            )?)
        }
    };
    Ok(broker)
}

/// Start the audit pipeline, or a disabled one when `audit.enabled` is off
pub fn audit_pipeline(
    configuration: &Configuration,
) -> anyhow::Result<(AuditPipeline, Option<AuditWorkers>)> {
    if !configuration.audit_enabled() {
        info!("Audit events disabled");
        return Ok((AuditPipeline::disabled(), None));
    }

    let settings = AuditSettings {
        topic: configuration.audit_topic(),
        workers: configuration.audit_workers(),
        queue_capacity: configuration.audit_queue_capacity(),
    };
    info!(
        workers = settings.workers,
        queue_capacity = settings.queue_capacity,
        "Audit events enabled on topic {}",
        settings.topic
    );
    let (pipeline, workers) = AuditPipeline::start(broker(configuration)?, settings);
    Ok((pipeline, Some(workers)))
}

/// Build the shared application state
///
/// The returned workers must be joined after the state is dropped so that
/// queued audit events drain.
pub fn build_app_state(
    configuration: &Configuration,
) -> anyhow::Result<(AppState, Option<AuditWorkers>)> {
    let store = document_store(configuration)?;
    let cache = cache_layer(configuration);
    let (audit, workers) = audit_pipeline(configuration)?;

    let repository = ConfigRepository::new(
        store,
        cache,
        audit,
        RepositorySettings {
            operation_timeout: configuration.operation_timeout(),
        },
    );
    let auth = auth_provider(configuration)?;

    Ok((AppState::new(repository, auth), workers))
}
