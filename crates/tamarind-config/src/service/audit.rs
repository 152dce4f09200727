//! Audit emission pipeline
//!
//! `emit` never blocks and never reports failure to the caller. Events go
//! into a bounded queue drained by a fixed pool of worker tasks, which
//! serialize them to the `AuditLog` wire message and hand the bytes to the
//! broker. A full queue drops the event and counts it; a broker failure is
//! logged and counted. Nothing is retried.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use metrics::counter;
use prost::Message;
use tamarind_common::{AUDIT_TOPIC, SERVICE_NAME};
use tamarind_persistence::BrokerClient;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::model::audit_log::{self, AuditLog, MessageType};

/// Scalar value recorded in the audit payload
#[derive(Clone, Debug, PartialEq)]
pub enum DetailValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        DetailValue::Text(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        DetailValue::Text(v)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        DetailValue::Integer(v)
    }
}

impl From<u64> for DetailValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(DetailValue::Integer)
            .unwrap_or_else(|_| DetailValue::Text(v.to_string()))
    }
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        DetailValue::Flag(v)
    }
}

impl DetailValue {
    fn to_prost(&self) -> prost_types::Value {
        use prost_types::value::Kind;

        let kind = match self {
            DetailValue::Text(s) => Kind::StringValue(s.clone()),
            DetailValue::Integer(i) => Kind::NumberValue(*i as f64),
            DetailValue::Flag(b) => Kind::BoolValue(*b),
        };
        prost_types::Value { kind: Some(kind) }
    }
}

/// HTTP request metadata copied into every audit event
#[derive(Clone, Debug, Default)]
pub struct RequestMeta<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub host: &'a str,
    pub protocol: &'a str,
    pub remote_addr: Option<&'a str>,
    pub content_length: Option<u64>,
}

/// Call-site details carried by an audit event
///
/// Keys are kept sorted. Values are strings, integers, or booleans;
/// anything richer is rendered to a string with `insert_rendered`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestDetails {
    fields: BTreeMap<String, DetailValue>,
}

impl RequestDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Details pre-filled with the `request.*` keys
    pub fn for_request(meta: &RequestMeta<'_>) -> Self {
        let mut details = Self::new();
        details.insert("request.method", meta.method);
        details.insert("request.uri", meta.uri);
        details.insert("request.host", meta.host);
        details.insert("request.protocol", meta.protocol);
        if let Some(addr) = meta.remote_addr {
            details.insert("request.remoteaddr", addr);
        }
        details.insert(
            "request.contentlength",
            DetailValue::from(meta.content_length.unwrap_or(0)),
        );
        details
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DetailValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Record a non-scalar value by its debug rendering
    pub fn insert_rendered(&mut self, key: impl Into<String>, value: &impl fmt::Debug) {
        self.insert(key, format!("{:?}", value));
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_struct(&self) -> prost_types::Struct {
        prost_types::Struct {
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_prost()))
                .collect(),
        }
    }
}

/// A queued audit event
#[derive(Clone, Debug, PartialEq)]
pub struct AuditEvent {
    pub topic: String,
    pub operation: String,
    pub details: RequestDetails,
    pub sent: DateTime<Utc>,
}

impl AuditEvent {
    pub fn to_wire(&self) -> AuditLog {
        AuditLog {
            topic: self.topic.clone(),
            func_name: self.operation.clone(),
            service: SERVICE_NAME.to_string(),
            message_type: MessageType::Audit as i32,
            message: Some(self.details.to_struct()),
            sent: Some(audit_log::timestamp(self.sent)),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_wire().encode_to_vec()
    }
}

/// Audit pipeline tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditSettings {
    pub topic: String,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            topic: AUDIT_TOPIC.to_string(),
            workers: 2,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Default)]
struct AuditCounters {
    dropped: AtomicU64,
    failed: AtomicU64,
    delivered: AtomicU64,
}

/// Read-only view of the pipeline counters
///
/// Does not keep the queue open, so it can outlive every pipeline handle.
#[derive(Clone, Debug, Default)]
pub struct AuditStats {
    counters: Arc<AuditCounters>,
}

impl AuditStats {
    /// Events dropped because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// Events the broker failed to accept
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Events the broker accepted
    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Relaxed)
    }
}

struct PipelineShared {
    tx: mpsc::Sender<AuditEvent>,
    topic: String,
    stats: AuditStats,
}

/// Handle used by callers to emit audit events
///
/// Cheap to clone. The worker pool stops once every handle is dropped and
/// the queue has drained.
#[derive(Clone)]
pub struct AuditPipeline {
    shared: Option<Arc<PipelineShared>>,
}

/// Worker pool behind an `AuditPipeline`
pub struct AuditWorkers {
    handles: Vec<JoinHandle<()>>,
    stats: AuditStats,
}

impl AuditPipeline {
    /// Spawn the worker pool on the current tokio runtime
    pub fn start(broker: Arc<dyn BrokerClient>, settings: AuditSettings) -> (Self, AuditWorkers) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let stats = AuditStats::default();

        let handles = (0..settings.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    rx.clone(),
                    broker.clone(),
                    stats.counters.clone(),
                ))
            })
            .collect();

        let pipeline = Self {
            shared: Some(Arc::new(PipelineShared {
                tx,
                topic: settings.topic,
                stats: stats.clone(),
            })),
        };
        (pipeline, AuditWorkers { handles, stats })
    }

    /// Pipeline that discards every event
    pub fn disabled() -> Self {
        Self { shared: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.is_some()
    }

    /// Topic configured for this pipeline
    pub fn topic(&self) -> &str {
        self.shared
            .as_ref()
            .map(|s| s.topic.as_str())
            .unwrap_or(AUDIT_TOPIC)
    }

    /// Queue an audit event without waiting
    pub fn emit(&self, topic: &str, operation: &str, details: RequestDetails) {
        let Some(shared) = &self.shared else {
            return;
        };

        let event = AuditEvent {
            topic: topic.to_string(),
            operation: operation.to_string(),
            details,
            sent: Utc::now(),
        };

        if let Err(e) = shared.tx.try_send(event) {
            shared.stats.counters.dropped.fetch_add(1, Ordering::Relaxed);
            counter!("audit_events_dropped_total", "operation" => operation.to_string())
                .increment(1);
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(operation, "audit queue full, dropping event")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!(operation, "audit workers stopped, dropping event")
                }
            }
        }
    }

    /// Counters of this pipeline; all zero when disabled
    pub fn stats(&self) -> AuditStats {
        self.shared
            .as_ref()
            .map(|s| s.stats.clone())
            .unwrap_or_default()
    }

    pub fn dropped(&self) -> u64 {
        self.stats().dropped()
    }

    pub fn failed(&self) -> u64 {
        self.stats().failed()
    }

    pub fn delivered(&self) -> u64 {
        self.stats().delivered()
    }
}

impl AuditWorkers {
    /// Wait for the workers to drain the queue and exit
    ///
    /// Returns once every `AuditPipeline` handle has been dropped and all
    /// queued events have been handed to the broker.
    pub async fn join(self) -> AuditStats {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("audit worker terminated abnormally: {}", e);
            }
        }
        self.stats
    }
}

async fn run_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<AuditEvent>>>,
    broker: Arc<dyn BrokerClient>,
    counters: Arc<AuditCounters>,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(event) = next else {
            break;
        };

        match broker.produce(&event.topic, event.encode()).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                counter!("audit_events_delivered_total").increment(1);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                counter!("audit_events_failed_total").increment(1);
                warn!(
                    operation = %event.operation,
                    topic = %event.topic,
                    "unable to emit audit event: {}",
                    e
                );
            }
        }
    }
    debug!(worker_id, "audit worker stopped");
}
