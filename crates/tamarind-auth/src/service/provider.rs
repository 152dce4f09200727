//! Host identity provider
//!
//! Hosts register with a name and receive a host id and an API key. Config
//! requests then present both; the provider resolves them to the host name.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tamarind_common::sanitize_log_value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::{ApiKeyRecord, AuthError, HostCredentials, RESERVED_HOST_NAMES};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a host id and API key to the host name
    async fn validate_api_key(&self, host_id: &str, api_key: &str) -> Result<String, AuthError>;

    /// Register a host and mint its credentials
    async fn generate_api_key(
        &self,
        name: &str,
        tags: &[String],
    ) -> Result<HostCredentials, AuthError>;

    /// Look up the stored record for a host, checking its key
    async fn get_api_key(&self, host_id: &str, api_key: &str)
    -> Result<ApiKeyRecord, AuthError>;
}

/// Hex SHA-256 digest of an API key
pub fn key_digest(api_key: &str) -> String {
    const_hex::encode(Sha256::digest(api_key.as_bytes()))
}

fn mint_key() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Validate a host name and mint a record plus the one-time credentials
pub(crate) fn register_host(
    name: &str,
    tags: &[String],
) -> Result<(ApiKeyRecord, HostCredentials), AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("name is required".to_string()));
    }
    if RESERVED_HOST_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(AuthError::InvalidName(format!("'{}' is reserved", name)));
    }

    let host_id = Uuid::new_v4().to_string();
    let api_key = mint_key();
    let record = ApiKeyRecord {
        host_id: host_id.clone(),
        name: name.to_string(),
        tags: tags.to_vec(),
        key_digest: key_digest(&api_key),
        created: Utc::now(),
    };
    Ok((record, HostCredentials { host_id, api_key }))
}

/// Accept `record` only when `api_key` hashes to its digest
pub(crate) fn check_key(record: ApiKeyRecord, api_key: &str) -> Result<ApiKeyRecord, AuthError> {
    if record.key_digest != key_digest(api_key) {
        debug!(host_id = %sanitize_log_value(&record.host_id), "api key mismatch");
        return Err(AuthError::InvalidKey);
    }
    Ok(record)
}

/// Process-local API-key provider
#[derive(Default)]
pub struct MemoryAuthProvider {
    keys: DashMap<String, ApiKeyRecord>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn lookup(&self, host_id: &str, api_key: &str) -> Result<ApiKeyRecord, AuthError> {
        let record = self
            .keys
            .get(host_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AuthError::UnknownHost(host_id.to_string()))?;
        check_key(record, api_key)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn validate_api_key(&self, host_id: &str, api_key: &str) -> Result<String, AuthError> {
        self.lookup(host_id, api_key).map(|record| record.name)
    }

    async fn generate_api_key(
        &self,
        name: &str,
        tags: &[String],
    ) -> Result<HostCredentials, AuthError> {
        let (record, credentials) = register_host(name, tags)?;
        info!(
            host = %sanitize_log_value(&record.name),
            "registered host {}",
            record.host_id
        );
        self.keys.insert(record.host_id.clone(), record);
        Ok(credentials)
    }

    async fn get_api_key(
        &self,
        host_id: &str,
        api_key: &str,
    ) -> Result<ApiKeyRecord, AuthError> {
        self.lookup(host_id, api_key)
    }
}
