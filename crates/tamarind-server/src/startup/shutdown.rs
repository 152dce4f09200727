//! Graceful shutdown handling
//!
//! The HTTP server stops on Ctrl+C or SIGTERM. Once it has returned and the
//! application state is dropped, the audit queue is drained.

use std::time::Duration;

use tamarind_config::{AuditStats, AuditWorkers};
use tracing::{info, warn};

/// Default time allowed for queued audit events to reach the broker
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for the audit workers to drain the queue
///
/// Every `AuditPipeline` handle must already be dropped, otherwise this
/// waits until `deadline` and gives up.
pub async fn drain_audit(workers: Option<AuditWorkers>, deadline: Duration) -> Option<AuditStats> {
    let workers = workers?;

    match tokio::time::timeout(deadline, workers.join()).await {
        Ok(stats) => {
            info!(
                delivered = stats.delivered(),
                failed = stats.failed(),
                dropped = stats.dropped(),
                "Audit queue drained"
            );
            Some(stats)
        }
        Err(_) => {
            warn!("Audit queue not drained within {:?}", deadline);
            None
        }
    }
}
