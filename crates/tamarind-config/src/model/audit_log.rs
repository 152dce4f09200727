//! Audit log wire message
//!
//! Binary layout consumed by downstream audit readers. Field numbers and
//! types must not change:
//!
//! ```text
//! message AuditLog {
//!   enum MessageType { AUDIT = 0; }
//!   string topic = 1;
//!   string funcName = 2;
//!   string service = 3;
//!   MessageType messageType = 4;
//!   google.protobuf.Struct message = 5;
//!   google.protobuf.Timestamp sent = 6;
//! }
//! ```

use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, prost::Message)]
pub struct AuditLog {
    #[prost(string, tag = "1")]
    pub topic: String,
    #[prost(string, tag = "2")]
    pub func_name: String,
    #[prost(string, tag = "3")]
    pub service: String,
    #[prost(enumeration = "MessageType", tag = "4")]
    pub message_type: i32,
    #[prost(message, optional, tag = "5")]
    pub message: Option<prost_types::Struct>,
    #[prost(message, optional, tag = "6")]
    pub sent: Option<prost_types::Timestamp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Audit = 0,
}

/// Convert a UTC instant to a protobuf timestamp
pub fn timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}
