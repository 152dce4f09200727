//! Configuration service layer
//!
//! - `repository`: versioned config reads and writes
//! - `cache`: cache-aside snapshots of head documents
//! - `audit`: non-blocking audit emission

pub mod audit;
pub mod cache;
pub mod repository;

pub use audit::{
    AuditEvent, AuditPipeline, AuditSettings, AuditStats, AuditWorkers, DetailValue,
    RequestDetails, RequestMeta,
};
pub use cache::{CACHE_TTL, CacheLayer, cache_key};
pub use repository::{ConfigRepository, RepositorySettings, checksum, is_config_id, page_bounds};
