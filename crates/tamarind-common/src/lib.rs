//! Tamarind Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all Tamarind components:
//! - Error taxonomy for the config store, cache, and broker collaborators
//! - Error codes for API responses
//! - Log-sanitizing helpers
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{BrokerError, CacheError, ConfigError, ErrorCode, Outcome, StoreError};
pub use utils::{is_valid, obfuscate, sanitize_log_value};

/// Service name stamped on every audit event
pub const SERVICE_NAME: &str = "tamarind";

/// Topic used for configuration audit events
pub const AUDIT_TOPIC: &str = "config.audit";

/// Prefix of every cache key holding a config snapshot
pub const CACHE_KEY_PREFIX: &str = "config_";

/// Fixed time-to-live of cached config snapshots, in seconds
pub const CACHE_TTL_SECS: u64 = 3600;

/// Page size used when `limit` is omitted
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Upper bound applied to any requested `limit`
pub const MAX_PAGE_SIZE: u64 = 100;

/// Audit operation names
pub mod operation {
    pub const INSERT_CONFIG: &str = "InsertConfig";
    pub const GET_CONFIG: &str = "GetConfig";
    pub const GET_CONFIGS: &str = "GetConfigs";
    pub const UPDATE_CONFIG_BY_ID: &str = "UpdateConfigByID";
    pub const GET_CONFIG_HISTORY: &str = "GetConfigHistory";
    pub const HOST_REGISTER: &str = "HostRegister";
    pub const HOST_LOGIN: &str = "HostLogin";
}
