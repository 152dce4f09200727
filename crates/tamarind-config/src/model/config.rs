// Configuration request and response models
// Bodies use snake_case field names on the wire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tamarind_persistence::{ConfigDocument, ConfigVersionRecord, Payload};

pub use tamarind_persistence::{ConfigSummary, UpdateOutcome};

/// Body of a config insert
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigIn {
    pub config_name: String,
    pub owner: String,
    #[serde(default)]
    pub config: Payload,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Body of an update by config id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfigIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub config: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

/// Result of an insert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub config_id: String,
    pub version: i64,
}

/// Result of an update by id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateByIdOutcome {
    pub config_id: String,
    pub version: i64,
    #[serde(flatten)]
    pub head: UpdateOutcome,
}

/// API projection of a head document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config_id: String,
    pub config_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub created_by: String,
    pub version: i64,
    pub config: Payload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    pub checksum: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl From<ConfigDocument> for ConfigResponse {
    fn from(doc: ConfigDocument) -> Self {
        Self {
            config_id: doc.config_id,
            config_name: doc.config_name,
            host: doc.host,
            created_by: doc.owner,
            version: doc.version,
            config: doc.payload,
            parents: doc.parents,
            checksum: doc.checksum,
            created: doc.created,
            modified: doc.modified,
        }
    }
}

/// Entry of a config's version history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersionResponse {
    pub version: i64,
    pub config: Payload,
    pub checksum: String,
    pub created_by: String,
    pub created: DateTime<Utc>,
}

impl From<ConfigVersionRecord> for ConfigVersionResponse {
    fn from(record: ConfigVersionRecord) -> Self {
        Self {
            version: record.version,
            config: record.payload,
            checksum: record.checksum,
            created_by: record.created_by,
            created: record.created,
        }
    }
}
