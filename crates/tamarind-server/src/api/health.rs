//! Liveness and metrics endpoints

use actix_web::{HttpResponse, Responder, get, web};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::model::Result;

#[derive(Clone, Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/v1/health
#[get("/health")]
pub async fn health() -> impl Responder {
    Result::<HealthStatus>::http_success(HealthStatus {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /metrics
///
/// Prometheus text exposition; 404 when no recorder is installed.
#[get("/metrics")]
pub async fn render_metrics(handle: Option<web::Data<PrometheusHandle>>) -> impl Responder {
    match handle {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NotFound().finish(),
    }
}
