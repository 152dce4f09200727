//! Error types and error codes for Tamarind
//!
//! This module defines:
//! - `StoreError`, `CacheError`, `BrokerError`: failures of the external collaborators
//! - `ConfigError`: the taxonomy surfaced by config repository operations
//! - `Outcome`: the user-visible failure class of a `ConfigError`
//! - `ErrorCode`: Structured error codes for API responses

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Document store failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Backend(String),

    #[error("document store deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("malformed document: {0}")]
    Decode(String),
}

/// Cache failures
///
/// A miss is not an error; it is reported as `Ok(None)` by the cache layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache is disabled")]
    Disabled,

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

impl CacheError {
    /// Whether the read path may fall back to the document store.
    ///
    /// Only corruption of an entry we wrote ourselves is surfaced.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, CacheError::Corrupt(_))
    }
}

/// Message broker failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    #[error("broker rejected message: {0}")]
    Rejected(String),
}

/// Errors returned by config repository operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config '{0}' not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// User-visible failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    NotFound,
    BadRequest,
    Internal,
}

impl ConfigError {
    pub fn outcome(&self) -> Outcome {
        match self {
            ConfigError::NotFound(_) => Outcome::NotFound,
            ConfigError::Validation(_) => Outcome::BadRequest,
            ConfigError::Store(_) | ConfigError::Cache(_) => Outcome::Internal,
        }
    }

    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            ConfigError::NotFound(_) => RESOURCE_NOT_FOUND,
            ConfigError::Validation(_) => PARAMETER_VALIDATE_ERROR,
            ConfigError::Store(_) => DATA_ACCESS_ERROR,
            ConfigError::Cache(_) => SERVER_ERROR,
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const HOST_REGISTER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 22000,
    message: "unable to register host",
};

pub const HOST_LOGIN_ERROR: ErrorCode<'static> = ErrorCode {
    code: 22001,
    message: "unable to login host",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};
