//! Application state shared across handlers

use std::sync::Arc;

use tamarind_auth::AuthProvider;
use tamarind_config::{AuditPipeline, ConfigRepository};

pub struct AppState {
    pub repository: ConfigRepository,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(repository: ConfigRepository, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repository, auth }
    }

    /// Pipeline used for host register/login events
    pub fn audit(&self) -> &AuditPipeline {
        self.repository.audit()
    }
}
