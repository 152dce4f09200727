//! Authentication services

pub mod embedded;
pub mod provider;

pub use embedded::RocksAuthProvider;
pub use provider::{AuthProvider, MemoryAuthProvider};
