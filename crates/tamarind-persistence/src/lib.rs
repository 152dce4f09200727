//! Tamarind Persistence - Data model and storage collaborators
//!
//! This crate provides:
//! - Typed document model for config heads and version records
//! - Collaborator traits: `DocumentStore`, `CacheClient`, `BrokerClient`
//! - Bundled backends: in-memory and RocksDB document stores, a moka cache
//!   client, and log / REST-proxy brokers

pub mod broker;
pub mod cache;
pub mod embedded;
pub mod memory;
pub mod model;
pub mod traits;

// Re-export traits
pub use traits::{BrokerClient, CacheClient, DocumentStore};

// Re-export backends
pub use broker::{LogBroker, RestProxyBroker};
pub use cache::MokaCacheClient;
pub use embedded::RocksDocumentStore;
pub use memory::MemoryDocumentStore;

// Re-export model types
pub use model::{
    ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord, HeadUpdate, Payload,
    StorageMode, UpdateOutcome,
};
