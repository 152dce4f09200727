//! Document store trait
//!
//! Defines the collection-style interface over head documents and their
//! append-only version records. Every operation is atomic per document;
//! nothing spans documents.

use async_trait::async_trait;
use tamarind_common::StoreError;

use crate::model::{
    ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord, HeadUpdate, UpdateOutcome,
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find the first head document matching the filter
    async fn find_one(&self, filter: &ConfigFilter) -> Result<Option<ConfigDocument>, StoreError>;

    /// List head documents in store-native order
    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<ConfigSummary>, StoreError>;

    /// Append a version record, returning its record id
    async fn insert_version(&self, record: &ConfigVersionRecord) -> Result<String, StoreError>;

    /// Update the first head matching the filter
    ///
    /// With `upsert` set and no match, a `HeadUpdate::Replace` document is
    /// inserted instead; `HeadUpdate::Advance` never inserts.
    async fn update_one(
        &self,
        filter: &ConfigFilter,
        update: HeadUpdate,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    /// All version records of a config, ascending by version
    async fn find_versions(&self, config_id: &str)
    -> Result<Vec<ConfigVersionRecord>, StoreError>;
}
