// Embedded persistence backend using RocksDB
// Provides durable single-node storage without an external document database

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use tamarind_common::StoreError;
use tracing::info;

use crate::model::{
    ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord, HeadUpdate, UpdateOutcome,
};
use crate::traits::DocumentStore;

/// Column family holding head documents, keyed by config id
pub const CF_CONFIG: &str = "config";
/// Column family holding version records, keyed by `config_id@@version@@record_id`
pub const CF_CONFIG_VERSION: &str = "config_version";
/// Column family mapping a head's (name, host) scope to its config id
pub const CF_CONFIG_NAME_INDEX: &str = "config_name_index";

/// Standalone embedded document store using RocksDB
///
/// Values are JSON-encoded documents. Head updates take `write_lock` so the
/// find-then-put of an upsert is atomic for the document it touches. Every
/// head write also writes its name index entry in the same batch.
pub struct RocksDocumentStore {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl RocksDocumentStore {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_CONFIG, cf_opts.clone()),
            ColumnFamilyDescriptor::new(CF_CONFIG_VERSION, cf_opts.clone()),
            ColumnFamilyDescriptor::new(CF_CONFIG_NAME_INDEX, cf_opts),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        info!("RocksDB document store opened at {}", path.as_ref().display());
        Ok(Self::new(Arc::new(db)))
    }

    /// Create from a raw RocksDB instance that already has all three column families
    pub fn new(db: Arc<DB>) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Get a column family handle
    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("Column family '{}' not found", name)))
    }

    fn version_key(record: &ConfigVersionRecord) -> String {
        format!(
            "{}@@{:020}@@{}",
            record.config_id, record.version, record.record_id
        )
    }

    /// Index key prefix shared by every host of a config name
    ///
    /// The name is length-prefixed so one name can never be a prefix of another's.
    fn name_prefix(config_name: &str) -> String {
        format!("{}:{}@@", config_name.len(), config_name)
    }

    fn name_key(config_name: &str, host: Option<&str>) -> String {
        match host {
            Some(host) => format!("{}={}", Self::name_prefix(config_name), host),
            None => format!("{}~", Self::name_prefix(config_name)),
        }
    }

    fn put_json<T: serde::Serialize>(
        &self,
        cf_name: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.db
            .put_cf(cf, key.as_bytes(), bytes)
            .map_err(|e| StoreError::Backend(format!("RocksDB put error: {}", e)))
    }

    fn decode_head(value: &[u8]) -> Result<ConfigDocument, StoreError> {
        serde_json::from_slice(value).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn get_head(&self, config_id: &[u8]) -> Result<Option<ConfigDocument>, StoreError> {
        let cf = self.cf(CF_CONFIG)?;
        let value = self
            .db
            .get_cf(cf, config_id)
            .map_err(|e| StoreError::Backend(format!("RocksDB get error: {}", e)))?;
        value.map(|v| Self::decode_head(&v)).transpose()
    }

    /// Resolve one index entry to its head, if the head still matches
    fn indexed_head(
        &self,
        index_key: &str,
        filter: &ConfigFilter,
    ) -> Result<Option<ConfigDocument>, StoreError> {
        let cf = self.cf(CF_CONFIG_NAME_INDEX)?;
        let config_id = self
            .db
            .get_cf(cf, index_key.as_bytes())
            .map_err(|e| StoreError::Backend(format!("RocksDB get error: {}", e)))?;
        match config_id {
            Some(id) => Ok(self.get_head(&id)?.filter(|d| filter.matches(d))),
            None => Ok(None),
        }
    }

    fn find_head(&self, filter: &ConfigFilter) -> Result<Option<ConfigDocument>, StoreError> {
        match filter {
            ConfigFilter::ById { config_id, .. } => {
                Ok(self.get_head(config_id.as_bytes())?.filter(|d| filter.matches(d)))
            }
            ConfigFilter::Scope { config_name, host }
            | ConfigFilter::ByName {
                config_name,
                host: host @ Some(_),
            } => self.indexed_head(&Self::name_key(config_name, host.as_deref()), filter),
            ConfigFilter::ByName { config_name, .. } => {
                let cf = self.cf(CF_CONFIG_NAME_INDEX)?;
                let prefix = Self::name_prefix(config_name);
                for item in self.db.prefix_iterator_cf(cf, prefix.as_bytes()) {
                    let (key, config_id) = item
                        .map_err(|e| StoreError::Backend(format!("RocksDB iterator error: {}", e)))?;
                    if !key.starts_with(prefix.as_bytes()) {
                        break;
                    }
                    if let Some(doc) = self.get_head(&config_id)?.filter(|d| filter.matches(d)) {
                        return Ok(Some(doc));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Write a head and its index entry, dropping the head it replaced
    fn write_head(&self, doc: &ConfigDocument, replaced: Option<&str>) -> Result<(), StoreError> {
        let heads = self.cf(CF_CONFIG)?;
        let index = self.cf(CF_CONFIG_NAME_INDEX)?;
        let bytes = serde_json::to_vec(doc).map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut batch = WriteBatch::default();
        if let Some(old_id) = replaced.filter(|id| *id != doc.config_id) {
            batch.delete_cf(heads, old_id.as_bytes());
        }
        batch.put_cf(heads, doc.config_id.as_bytes(), bytes);
        batch.put_cf(
            index,
            Self::name_key(&doc.config_name, doc.host.as_deref()).as_bytes(),
            doc.config_id.as_bytes(),
        );
        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(format!("RocksDB batch write error: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for RocksDocumentStore {
    async fn find_one(&self, filter: &ConfigFilter) -> Result<Option<ConfigDocument>, StoreError> {
        self.find_head(filter)
    }

    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<ConfigSummary>, StoreError> {
        let cf = self.cf(CF_CONFIG)?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let mut page = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::Start)
            .skip(offset)
            .take(limit)
        {
            let (_, value) =
                item.map_err(|e| StoreError::Backend(format!("RocksDB iterator error: {}", e)))?;
            page.push(Self::decode_head(&value)?.summary());
        }
        Ok(page)
    }

    async fn insert_version(&self, record: &ConfigVersionRecord) -> Result<String, StoreError> {
        self.put_json(CF_CONFIG_VERSION, &Self::version_key(record), record)?;
        Ok(record.record_id.clone())
    }

    async fn update_one(
        &self,
        filter: &ConfigFilter,
        update: HeadUpdate,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let _guard = self.write_lock.lock();

        if let Some(mut doc) = self.find_head(filter)? {
            let previous_id = doc.config_id.clone();
            let modified = update.apply(&mut doc);
            if modified {
                self.write_head(&doc, Some(&previous_id))?;
            }
            return Ok(UpdateOutcome {
                matched: 1,
                modified: u64::from(modified),
                upserted_id: None,
            });
        }

        match update {
            HeadUpdate::Replace(doc) if upsert => {
                self.write_head(&doc, None)?;
                Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted_id: Some(doc.config_id),
                })
            }
            _ => Ok(UpdateOutcome::default()),
        }
    }

    async fn find_versions(
        &self,
        config_id: &str,
    ) -> Result<Vec<ConfigVersionRecord>, StoreError> {
        let cf = self.cf(CF_CONFIG_VERSION)?;
        let prefix = format!("{}@@", config_id);

        let mut records = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, prefix.as_bytes()) {
            let (key, value) =
                item.map_err(|e| StoreError::Backend(format!("RocksDB iterator error: {}", e)))?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let record: ConfigVersionRecord =
                serde_json::from_slice(&value).map_err(|e| StoreError::Decode(e.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}
