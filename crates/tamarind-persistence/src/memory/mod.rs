// In-memory document store
// Process-local backend for development and tests; contents are lost on restart

use async_trait::async_trait;
use parking_lot::RwLock;
use tamarind_common::StoreError;

use crate::model::{
    ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord, HeadUpdate, UpdateOutcome,
};
use crate::traits::DocumentStore;

/// In-memory document store
///
/// Heads and version records are kept in insertion order, which is the
/// store-native order returned by `find_page`. Each operation holds the
/// collection lock for its whole duration, so it is atomic per document.
#[derive(Default)]
pub struct MemoryDocumentStore {
    heads: RwLock<Vec<ConfigDocument>>,
    versions: RwLock<Vec<ConfigVersionRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of head documents
    pub fn head_count(&self) -> usize {
        self.heads.read().len()
    }

    /// Number of version records across all configs
    pub fn version_count(&self) -> usize {
        self.versions.read().len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(&self, filter: &ConfigFilter) -> Result<Option<ConfigDocument>, StoreError> {
        Ok(self.heads.read().iter().find(|d| filter.matches(d)).cloned())
    }

    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<ConfigSummary>, StoreError> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(self
            .heads
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .map(ConfigDocument::summary)
            .collect())
    }

    async fn insert_version(&self, record: &ConfigVersionRecord) -> Result<String, StoreError> {
        let mut versions = self.versions.write();
        if versions.iter().any(|v| v.record_id == record.record_id) {
            return Err(StoreError::Backend(format!(
                "duplicate record id {}",
                record.record_id
            )));
        }
        versions.push(record.clone());
        Ok(record.record_id.clone())
    }

    async fn update_one(
        &self,
        filter: &ConfigFilter,
        update: HeadUpdate,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut heads = self.heads.write();

        if let Some(doc) = heads.iter_mut().find(|d| filter.matches(d)) {
            let modified = update.apply(doc);
            return Ok(UpdateOutcome {
                matched: 1,
                modified: u64::from(modified),
                upserted_id: None,
            });
        }

        match update {
            HeadUpdate::Replace(doc) if upsert => {
                let id = doc.config_id.clone();
                heads.push(doc);
                Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted_id: Some(id),
                })
            }
            _ => Ok(UpdateOutcome::default()),
        }
    }

    async fn find_versions(
        &self,
        config_id: &str,
    ) -> Result<Vec<ConfigVersionRecord>, StoreError> {
        let mut records: Vec<ConfigVersionRecord> = self
            .versions
            .read()
            .iter()
            .filter(|v| v.config_id == config_id)
            .cloned()
            .collect();
        records.sort_by_key(|v| v.version);
        Ok(records)
    }
}
