//! Domain model types for the persistence abstraction layer
//!
//! Documents are typed at the storage boundary: every backend decodes into
//! these structs, so a malformed record surfaces as `StoreError::Decode`
//! instead of leaking a dynamic map into the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque configuration payload
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Current ("head") record of a configuration within its (name, host) scope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub config_id: String,
    pub config_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub owner: String,
    pub version: i64,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub parents: Vec<String>,
    pub checksum: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl ConfigDocument {
    /// Whether this head belongs to the given (name, host) scope
    pub fn in_scope(&self, config_name: &str, host: Option<&str>) -> bool {
        self.config_name == config_name && self.host.as_deref() == host
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            config_id: self.config_id.clone(),
            config_name: self.config_name.clone(),
            host: self.host.clone(),
            owner: self.owner.clone(),
            version: self.version,
            parents: self.parents.clone(),
            created: self.created,
            modified: self.modified,
        }
    }
}

/// Immutable snapshot appended on every accepted write
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersionRecord {
    pub record_id: String,
    pub config_id: String,
    pub config_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub version: i64,
    #[serde(default)]
    pub payload: Payload,
    pub checksum: String,
    pub created_by: String,
    pub created: DateTime<Utc>,
}

/// Head projection without payload, returned by paginated listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub config_id: String,
    pub config_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub owner: String,
    pub version: i64,
    #[serde(default)]
    pub parents: Vec<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Head document selector
///
/// For `ById` and `ByName`, `host: None` matches heads of any host.
/// `Scope` matches the (name, host) pair exactly, so `host: None` only
/// matches host-agnostic heads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigFilter {
    ById {
        config_id: String,
        host: Option<String>,
    },
    ByName {
        config_name: String,
        host: Option<String>,
    },
    Scope {
        config_name: String,
        host: Option<String>,
    },
}

impl ConfigFilter {
    pub fn by_id(config_id: impl Into<String>, host: Option<&str>) -> Self {
        ConfigFilter::ById {
            config_id: config_id.into(),
            host: host.map(str::to_string),
        }
    }

    pub fn by_name(config_name: impl Into<String>, host: Option<&str>) -> Self {
        ConfigFilter::ByName {
            config_name: config_name.into(),
            host: host.map(str::to_string),
        }
    }

    pub fn scope(config_name: impl Into<String>, host: Option<&str>) -> Self {
        ConfigFilter::Scope {
            config_name: config_name.into(),
            host: host.map(str::to_string),
        }
    }

    pub fn matches(&self, doc: &ConfigDocument) -> bool {
        let host_matches =
            |host: &Option<String>| host.is_none() || doc.host.as_deref() == host.as_deref();

        match self {
            ConfigFilter::ById { config_id, host } => {
                doc.config_id == *config_id && host_matches(host)
            }
            ConfigFilter::ByName { config_name, host } => {
                doc.config_name == *config_name && host_matches(host)
            }
            ConfigFilter::Scope { config_name, host } => {
                doc.in_scope(config_name, host.as_deref())
            }
        }
    }
}

/// Head document mutation
#[derive(Clone, Debug, PartialEq)]
pub enum HeadUpdate {
    /// Write every field; the only update that can upsert
    Replace(ConfigDocument),
    /// Move the head to a new version; `parents: None` keeps the current list
    Advance {
        version: i64,
        payload: Payload,
        parents: Option<Vec<String>>,
        checksum: String,
        modified: DateTime<Utc>,
    },
}

impl HeadUpdate {
    /// Apply this update to an existing head. Returns whether anything changed.
    pub fn apply(&self, doc: &mut ConfigDocument) -> bool {
        let before = doc.clone();
        match self {
            HeadUpdate::Replace(next) => *doc = next.clone(),
            HeadUpdate::Advance {
                version,
                payload,
                parents,
                checksum,
                modified,
            } => {
                doc.version = *version;
                doc.payload = payload.clone();
                if let Some(parents) = parents {
                    doc.parents = parents.clone();
                }
                doc.checksum = checksum.clone();
                doc.modified = *modified;
            }
        }
        *doc != before
    }
}

/// Result of a single-document update
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

/// Storage mode for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// Process-local store, lost on restart
    Memory,
    /// Embedded RocksDB on local disk
    RocksDb,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Memory => write!(f, "memory"),
            StorageMode::RocksDb => write!(f, "rocksdb"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageMode::Memory),
            "rocksdb" => Ok(StorageMode::RocksDb),
            _ => Err(format!("Invalid storage mode: {}", s)),
        }
    }
}
