//! Versioned configuration repository
//!
//! Orchestrates reads and writes of head documents and their version
//! records. Every public operation emits one audit event before touching
//! the store. Store and cache calls are bounded by
//! `RepositorySettings::operation_timeout`.
//!
//! Known gaps:
//! - Insert issues the version append and the head upsert concurrently with
//!   no transaction; one may commit while the other fails.
//! - Concurrent first inserts into the same scope can both claim version 1.
//! - `update_by_id` leaves any cached snapshot stale until its TTL expires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use sha2::{Digest, Sha256};
use tamarind_common::{
    CacheError, ConfigError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, StoreError, is_valid, operation,
    sanitize_log_value,
};
use tamarind_persistence::{
    ConfigDocument, ConfigFilter, ConfigSummary, ConfigVersionRecord, DocumentStore, HeadUpdate,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{ConfigIn, InsertOutcome, UpdateByIdOutcome, UpdateConfigIn};
use crate::service::audit::{AuditPipeline, RequestDetails};
use crate::service::cache::{CacheLayer, cache_key};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Deadline applied to each store or cache call
    pub operation_timeout: Duration,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(15),
        }
    }
}

/// Provenance fingerprint of a write
///
/// Lowercase hex SHA-256 of `"{name}:{owner}+{created}:{modified}"` with
/// RFC 3339 timestamps. It does not cover the payload.
pub fn checksum(
    config_name: &str,
    owner: &str,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
) -> String {
    let input = format!(
        "{}:{}+{}:{}",
        config_name,
        owner,
        created.to_rfc3339_opts(SecondsFormat::Nanos, true),
        modified.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );
    const_hex::encode(Sha256::digest(input.as_bytes()))
}

/// Whether an identifier is a config id rather than a config name
pub fn is_config_id(identifier: &str) -> bool {
    identifier.len() == 36 && Uuid::try_parse(identifier).is_ok()
}

/// Parse raw pagination parameters
///
/// Missing or empty values default to offset 0 and limit 100. Anything
/// that is not a non-negative integer is rejected. The limit is clamped to
/// 100, and a limit of 0 means the default page size.
pub fn page_bounds(offset: Option<&str>, limit: Option<&str>) -> Result<(u64, u64), ConfigError> {
    fn parse(name: &str, raw: Option<&str>, default: u64) -> Result<u64, ConfigError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(default),
            Some(value) => value.parse::<u64>().map_err(|_| {
                ConfigError::Validation(format!("{} must be a non-negative integer", name))
            }),
        }
    }

    let offset = parse("offset", offset, 0)?;
    let limit = match parse("limit", limit, DEFAULT_PAGE_SIZE)? {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    };
    Ok((offset, limit))
}

fn require(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} is required", name)));
    }
    Ok(())
}

/// Repository over injected store, cache, and audit handles
pub struct ConfigRepository {
    store: Arc<dyn DocumentStore>,
    cache: CacheLayer,
    audit: AuditPipeline,
    settings: RepositorySettings,
}

impl ConfigRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: CacheLayer,
        audit: AuditPipeline,
        settings: RepositorySettings,
    ) -> Self {
        Self {
            store,
            cache,
            audit,
            settings,
        }
    }

    pub fn audit(&self) -> &AuditPipeline {
        &self.audit
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    fn emit(&self, operation: &str, details: RequestDetails) {
        self.audit.emit(self.audit.topic(), operation, details);
    }

    async fn store_call<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let deadline = self.settings.operation_timeout;
        tokio::time::timeout(deadline, call)
            .await
            .map_err(|_| StoreError::Timeout(deadline))?
    }

    async fn cache_call<T>(
        &self,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        let deadline = self.settings.operation_timeout;
        tokio::time::timeout(deadline, call)
            .await
            .map_err(|_| CacheError::Timeout(deadline))?
    }

    /// Write a snapshot, logging instead of failing
    async fn populate_cache(&self, key: &str, doc: &ConfigDocument) {
        match self.cache_call(self.cache.set(key, doc)).await {
            Ok(()) => {}
            Err(CacheError::Disabled) => {}
            Err(e) => warn!(key = %sanitize_log_value(key), "unable to cache config: {}", e),
        }
    }

    /// Write a new version into the (name, host) scope
    ///
    /// Reuses the scope's config id when a head exists, otherwise mints one.
    pub async fn insert(
        &self,
        input: ConfigIn,
        host: Option<&str>,
        details: &RequestDetails,
    ) -> Result<InsertOutcome, ConfigError> {
        let mut event = details
            .clone()
            .with("config_name", input.config_name.as_str())
            .with("owner", input.owner.as_str());
        event.insert_rendered("config", &input.config);
        event.insert_rendered("parents", &input.parents);
        if let Some(host) = host {
            event.insert("host", host);
        }
        self.emit(operation::INSERT_CONFIG, event);

        require("config_name", &input.config_name)?;
        if !is_valid(&input.config_name) {
            return Err(ConfigError::Validation(
                "config_name may only contain letters, digits, '_', '.', ':' and '-'".to_string(),
            ));
        }

        let scope = ConfigFilter::scope(&input.config_name, host);
        let existing = self.store_call(self.store.find_one(&scope)).await?;

        let now = Utc::now();
        let (config_id, version, created) = match existing {
            Some(head) => (head.config_id, head.version + 1, head.created),
            None => (Uuid::new_v4().to_string(), 1, now),
        };
        let checksum = checksum(&input.config_name, &input.owner, created, now);

        let head = ConfigDocument {
            config_id: config_id.clone(),
            config_name: input.config_name.clone(),
            host: host.map(str::to_string),
            owner: input.owner.clone(),
            version,
            payload: input.config.clone(),
            parents: input.parents,
            checksum: checksum.clone(),
            created,
            modified: now,
        };
        let record = ConfigVersionRecord {
            record_id: Uuid::new_v4().to_string(),
            config_id: config_id.clone(),
            config_name: input.config_name,
            host: head.host.clone(),
            version,
            payload: input.config,
            checksum,
            created_by: input.owner,
            created: now,
        };

        let (appended, upserted) = tokio::join!(
            self.store_call(self.store.insert_version(&record)),
            self.store_call(
                self.store
                    .update_one(&scope, HeadUpdate::Replace(head.clone()), true)
            ),
        );
        let record_id = appended?;
        upserted?;

        info!(
            config = %sanitize_log_value(&head.config_name),
            version,
            "inserted config version {}",
            record_id
        );
        counter!("config_publish_total", "operation" => operation::INSERT_CONFIG).increment(1);

        self.populate_cache(&cache_key(&config_id, host), &head).await;
        self.populate_cache(&cache_key(&head.config_name, host), &head)
            .await;
        if host.is_some() {
            self.populate_cache(&cache_key(&config_id, None), &head).await;
        }

        Ok(InsertOutcome { config_id, version })
    }

    /// Read a head document by config id or config name
    pub async fn get(
        &self,
        identifier: &str,
        host: Option<&str>,
        details: &RequestDetails,
    ) -> Result<ConfigDocument, ConfigError> {
        let mut event = details.clone().with("config_id", identifier);
        if let Some(host) = host {
            event.insert("host", host);
        }
        self.emit(operation::GET_CONFIG, event);

        require("identifier", identifier)?;
        counter!("config_query_total", "operation" => operation::GET_CONFIG).increment(1);

        let key = cache_key(identifier, host);
        match self.cache_call(self.cache.get(&key)).await {
            Ok(Some(doc)) => return Ok(doc),
            Ok(None) => {}
            Err(CacheError::Disabled) => {}
            Err(e) if e.allows_fallback() => {
                warn!(key = %sanitize_log_value(&key), "cache unavailable, reading store: {}", e)
            }
            Err(e) => return Err(e.into()),
        }

        let filter = if is_config_id(identifier) {
            ConfigFilter::by_id(identifier, host)
        } else {
            ConfigFilter::by_name(identifier, host)
        };
        let doc = self
            .store_call(self.store.find_one(&filter))
            .await?
            .ok_or_else(|| ConfigError::NotFound(identifier.to_string()))?;

        self.populate_cache(&key, &doc).await;
        Ok(doc)
    }

    /// Page through head documents in store order
    ///
    /// Never consults the cache.
    pub async fn list(
        &self,
        offset: Option<&str>,
        limit: Option<&str>,
        details: &RequestDetails,
    ) -> Result<Vec<ConfigSummary>, ConfigError> {
        let event = details
            .clone()
            .with("offset", offset.unwrap_or_default())
            .with("limit", limit.unwrap_or_default());
        self.emit(operation::GET_CONFIGS, event);

        let (offset, limit) = page_bounds(offset, limit)?;
        counter!("config_query_total", "operation" => operation::GET_CONFIGS).increment(1);

        let page = self
            .store_call(self.store.find_page(offset, limit))
            .await?;
        debug!(offset, limit, returned = page.len(), "listed configs");
        Ok(page)
    }

    /// Append a version to an existing config and advance its head
    ///
    /// Cached snapshots of the config are left as they are.
    pub async fn update_by_id(
        &self,
        config_id: &str,
        input: UpdateConfigIn,
        details: &RequestDetails,
    ) -> Result<UpdateByIdOutcome, ConfigError> {
        let mut event = details
            .clone()
            .with("config_id", config_id)
            .with("requester", input.requester.as_str());
        if let Some(name) = &input.config_name {
            event.insert("config_name", name.as_str());
        }
        event.insert_rendered("config", &input.config);
        if let Some(parents) = &input.parents {
            event.insert_rendered("parents", parents);
        }
        self.emit(operation::UPDATE_CONFIG_BY_ID, event);

        require("config_id", config_id)?;

        let by_id = ConfigFilter::by_id(config_id, None);
        let head = self
            .store_call(self.store.find_one(&by_id))
            .await?
            .ok_or_else(|| ConfigError::NotFound(config_id.to_string()))?;

        let renamed = input
            .config_name
            .as_deref()
            .is_some_and(|name| !name.is_empty() && name != head.config_name);
        if renamed {
            return Err(ConfigError::Validation(format!(
                "config_name cannot change from '{}'",
                head.config_name
            )));
        }

        let requester = if input.requester.trim().is_empty() {
            head.owner.clone()
        } else {
            input.requester
        };
        let now = Utc::now();
        let version = head.version + 1;
        let checksum = checksum(&head.config_name, &requester, head.created, now);

        let record = ConfigVersionRecord {
            record_id: Uuid::new_v4().to_string(),
            config_id: head.config_id.clone(),
            config_name: head.config_name.clone(),
            host: head.host.clone(),
            version,
            payload: input.config.clone(),
            checksum: checksum.clone(),
            created_by: requester,
            created: now,
        };
        let record_id = self
            .store_call(self.store.insert_version(&record))
            .await?;

        let advance = HeadUpdate::Advance {
            version,
            payload: input.config,
            parents: input.parents,
            checksum,
            modified: now,
        };
        let outcome = self
            .store_call(self.store.update_one(&by_id, advance, false))
            .await?;

        info!(
            config_id = %sanitize_log_value(config_id),
            version,
            "updated config with version {}",
            record_id
        );
        counter!("config_publish_total", "operation" => operation::UPDATE_CONFIG_BY_ID)
            .increment(1);

        Ok(UpdateByIdOutcome {
            config_id: head.config_id,
            version,
            head: outcome,
        })
    }

    /// Version records of a config, oldest first
    pub async fn history(
        &self,
        config_id: &str,
        details: &RequestDetails,
    ) -> Result<Vec<ConfigVersionRecord>, ConfigError> {
        self.emit(
            operation::GET_CONFIG_HISTORY,
            details.clone().with("config_id", config_id),
        );

        require("config_id", config_id)?;
        counter!("config_query_total", "operation" => operation::GET_CONFIG_HISTORY).increment(1);

        let exists = self
            .store_call(self.store.find_one(&ConfigFilter::by_id(config_id, None)))
            .await?
            .is_some();
        if !exists {
            return Err(ConfigError::NotFound(config_id.to_string()));
        }

        Ok(self
            .store_call(self.store.find_versions(config_id))
            .await?)
    }
}
