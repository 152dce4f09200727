// Durable API-key provider on RocksDB
// Host records survive restarts so issued keys stay valid

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use tamarind_common::sanitize_log_value;
use tracing::info;

use crate::model::{ApiKeyRecord, AuthError, HostCredentials};
use crate::service::provider::{AuthProvider, check_key, register_host};

/// Column family holding `ApiKeyRecord`s as JSON, keyed by host id
pub const CF_HOST_KEY: &str = "host_key";

/// API-key provider persisting digest-only host records
pub struct RocksAuthProvider {
    db: Arc<DB>,
}

impl RocksAuthProvider {
    /// Open (or create) the host key database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cfs = vec![ColumnFamilyDescriptor::new(CF_HOST_KEY, Options::default())];
        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        info!("RocksDB host key store opened at {}", path.as_ref().display());
        Ok(Self::new(Arc::new(db)))
    }

    /// Create from a raw RocksDB instance that already has the `host_key` column family
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, AuthError> {
        self.db
            .cf_handle(CF_HOST_KEY)
            .ok_or_else(|| AuthError::Backend(format!("Column family '{}' not found", CF_HOST_KEY)))
    }

    fn lookup(&self, host_id: &str, api_key: &str) -> Result<ApiKeyRecord, AuthError> {
        let value = self
            .db
            .get_cf(self.cf()?, host_id.as_bytes())
            .map_err(|e| AuthError::Backend(format!("RocksDB get error: {}", e)))?
            .ok_or_else(|| AuthError::UnknownHost(host_id.to_string()))?;

        let record: ApiKeyRecord =
            serde_json::from_slice(&value).map_err(|e| AuthError::Backend(e.to_string()))?;
        check_key(record, api_key)
    }
}

#[async_trait]
impl AuthProvider for RocksAuthProvider {
    async fn validate_api_key(&self, host_id: &str, api_key: &str) -> Result<String, AuthError> {
        self.lookup(host_id, api_key).map(|record| record.name)
    }

    async fn generate_api_key(
        &self,
        name: &str,
        tags: &[String],
    ) -> Result<HostCredentials, AuthError> {
        let (record, credentials) = register_host(name, tags)?;
        let bytes = serde_json::to_vec(&record).map_err(|e| AuthError::Backend(e.to_string()))?;
        self.db
            .put_cf(self.cf()?, record.host_id.as_bytes(), bytes)
            .map_err(|e| AuthError::Backend(format!("RocksDB put error: {}", e)))?;

        info!(
            host = %sanitize_log_value(&record.name),
            "registered host {}",
            record.host_id
        );
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
