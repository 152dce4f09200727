//! Message broker trait

use async_trait::async_trait;
use tamarind_common::BrokerError;

/// Accepts an opaque payload for a topic
///
/// Callers treat this as fire-and-forget: an error is only ever logged.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}
