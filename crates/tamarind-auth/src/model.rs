// Host authentication models and errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names a host may not register under
pub const RESERVED_HOST_NAMES: [&str; 2] = ["apikey", "name"];

/// Host authentication failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid api key")]
    InvalidKey,

    #[error("unknown host {0}")]
    UnknownHost(String),

    #[error("invalid host name: {0}")]
    InvalidName(String),

    #[error("auth backend error: {0}")]
    Backend(String),
}

/// Body of a host registration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRegisterIn {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of a host login
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HostLoginIn {
    pub apikey: String,
    pub host: String,
}

/// Credentials handed out once, at registration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostCredentials {
    pub host_id: String,
    pub api_key: String,
}

/// Stored API key; only the digest of the key is kept
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub host_id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub key_digest: String,
    pub created: DateTime<Utc>,
}
