//! Tamarind Config - Versioned configuration store
//!
//! This crate provides:
//! - `ConfigRepository`: versioned reads and writes of configuration documents
//! - `CacheLayer`: cache-aside snapshots of head documents
//! - `AuditPipeline`: non-blocking audit emission to a message broker
//! - The audit wire schema and request models

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::{
    AuditPipeline, AuditSettings, AuditStats, AuditWorkers, CacheLayer, ConfigRepository,
    DetailValue, RepositorySettings, RequestDetails, RequestMeta,
};
