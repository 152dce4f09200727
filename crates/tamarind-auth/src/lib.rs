//! Tamarind Auth - Host authentication
//!
//! This crate provides:
//! - The `AuthProvider` trait consumed by the routing layer
//! - In-memory and RocksDB-backed API-key providers
//! - Host register/login request models

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::{AuthProvider, MemoryAuthProvider, RocksAuthProvider};
