// Message broker clients for audit events

use std::time::Duration;

use async_trait::async_trait;
use tamarind_common::BrokerError;
use tracing::debug;

use crate::traits::BrokerClient;

/// Broker that only logs what it would have sent
///
/// Used when no broker endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct LogBroker;

#[async_trait]
impl BrokerClient for LogBroker {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        debug!(topic, bytes = payload.len(), "discarding audit message");
        Ok(())
    }
}

/// Broker client for an HTTP produce endpoint (Kafka REST proxy style)
///
/// Each message is POSTed as `application/octet-stream` to
/// `{endpoint}/topics/{topic}`.
#[derive(Debug, Clone)]
pub struct RestProxyBroker {
    client: reqwest::Client,
    endpoint: String,
}

impl RestProxyBroker {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{}", self.endpoint, topic)
    }
}

#[async_trait]
impl BrokerClient for RestProxyBroker {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let response = self
            .client
            .post(self.topic_url(topic))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BrokerError::Rejected(format!(
                "{} responded with {}",
                self.topic_url(topic),
                status
            )))
        }
    }
}
