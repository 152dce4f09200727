//! Configuration data models
//!
//! - Request bodies for insert and update
//! - API projection of head documents
//! - The audit log wire message

pub mod audit_log;
pub mod config;

pub use audit_log::{AuditLog, MessageType};
pub use config::*;
