//! Collaborator traits for the config store
//!
//! The core only ever sees these traits. Concrete backends live in
//! `memory`, `embedded`, `cache`, and `broker`.

pub mod broker;
pub mod cache;
pub mod document;

pub use broker::BrokerClient;
pub use cache::CacheClient;
pub use document::DocumentStore;
