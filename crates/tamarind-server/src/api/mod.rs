//! HTTP API
//!
//! All routes live under `/api/v1`. Config routes require a host API key.

pub mod auth;
pub mod config;
pub mod health;
pub mod host;
pub mod route;

use actix_web::{HttpRequest, http::header};
use tamarind_config::{RequestDetails, RequestMeta};

/// Audit details describing an incoming request
///
/// Headers are left out; they carry the bearer token.
pub fn request_details(req: &HttpRequest) -> RequestDetails {
    let uri = req.uri().to_string();
    let protocol = format!("{:?}", req.version());
    let remote_addr = req.peer_addr().map(|addr| addr.to_string());
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let connection_info = req.connection_info();

    RequestDetails::for_request(&RequestMeta {
        method: req.method().as_str(),
        uri: &uri,
        host: connection_info.host(),
        protocol: &protocol,
        remote_addr: remote_addr.as_deref(),
        content_length,
    })
}
