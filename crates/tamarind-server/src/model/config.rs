//! Configuration management for Tamarind server
//!
//! Settings are layered, lowest priority first: `conf/application.yml`
//! (or the file named by `--config`), environment variables prefixed
//! with `TAMARIND` (nested keys joined by `__`, e.g.
//! `TAMARIND__SERVER__PORT`), then command line flags.

use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use tamarind_common::{AUDIT_TOPIC, SERVICE_NAME};
use tamarind_persistence::StorageMode;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data/tamarind";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_AUDIT_WORKERS: usize = 2;
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_BROKER_TIMEOUT_SECS: u64 = 5;

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(name = "tamarind-server", about = "Multi-tenant configuration store")]
pub struct Cli {
    /// Configuration file to load instead of conf/application.yml
    #[arg(short = 'c', long = "config", env = "TAMARIND_CONFIG")]
    pub config: Option<String>,
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
    /// Storage backend: memory or rocksdb
    #[arg(short = 's', long = "storage")]
    pub storage: Option<String>,
}

/// Where audit events are delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrokerKind {
    /// Log and discard
    Log,
    /// POST to a REST proxy in front of the broker
    Rest,
}

impl std::str::FromStr for BrokerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(BrokerKind::Log),
            "rest" => Ok(BrokerKind::Rest),
            _ => Err(format!("Invalid audit broker: {}", s)),
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration using the process arguments
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(args: Cli) -> Result<Self, ConfigError> {
        let file = args
            .config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let required = args.config.is_some();

        let mut config_builder = Config::builder()
            .add_source(File::with_name(&file).required(required))
            .add_source(
                Environment::with_prefix("TAMARIND")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = args.port {
            config_builder = config_builder.set_override("server.port", i64::from(v))?;
        }
        if let Some(v) = args.storage {
            config_builder = config_builder.set_override("storage.mode", v)?;
        }

        Ok(Configuration {
            config: config_builder.build()?,
        })
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn log_level(&self) -> String {
        self.config
            .get_string("log.level")
            .unwrap_or("info".to_string())
    }

    pub fn service_name(&self) -> String {
        self.config
            .get_string("log.name")
            .unwrap_or(SERVICE_NAME.to_string())
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    pub fn storage_mode(&self) -> Result<StorageMode, String> {
        self.config
            .get_string("storage.mode")
            .unwrap_or("memory".to_string())
            .to_lowercase()
            .parse()
    }

    pub fn data_dir(&self) -> String {
        self.config
            .get_string("storage.data_dir")
            .unwrap_or(DEFAULT_DATA_DIR.to_string())
    }

    /// Host key database directory; defaults to `{storage.data_dir}-hosts`
    pub fn host_data_dir(&self) -> String {
        self.config
            .get_string("storage.host_data_dir")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("{}-hosts", self.data_dir()))
    }

    /// Deadline applied to each store and cache call
    pub fn operation_timeout(&self) -> Duration {
        let secs = self
            .config
            .get_int("storage.timeout_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    // ========================================================================
    // Cache Configuration
    // ========================================================================

    pub fn cache_enabled(&self) -> bool {
        self.config.get_bool("cache.enabled").unwrap_or(true)
    }

    pub fn cache_max_capacity(&self) -> u64 {
        self.config
            .get_int("cache.max_capacity")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    // ========================================================================
    // Audit Configuration
    // ========================================================================

    pub fn audit_enabled(&self) -> bool {
        self.config.get_bool("audit.enabled").unwrap_or(false)
    }

    pub fn audit_topic(&self) -> String {
        self.config
            .get_string("audit.topic")
            .unwrap_or(AUDIT_TOPIC.to_string())
    }

    pub fn audit_workers(&self) -> usize {
        self.config
            .get_int("audit.workers")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_AUDIT_WORKERS)
    }

    pub fn audit_queue_capacity(&self) -> usize {
        self.config
            .get_int("audit.queue_capacity")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_AUDIT_QUEUE_CAPACITY)
    }

    pub fn audit_broker(&self) -> Result<BrokerKind, String> {
        self.config
            .get_string("audit.broker")
            .unwrap_or("log".to_string())
            .parse()
    }

    pub fn audit_endpoint(&self) -> Option<String> {
        self.config
            .get_string("audit.endpoint")
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    pub fn audit_broker_timeout(&self) -> Duration {
        let secs = self
            .config
            .get_int("audit.timeout_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_BROKER_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}
