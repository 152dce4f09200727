//! Host registration and login
//!
//! - POST /api/v1/host/register - mint a host id and API key
//! - POST /api/v1/host/login - check an API key against a host id and
//!   return the host's stored name and tags

use actix_web::{HttpRequest, Responder, post, web};
use serde::{Deserialize, Serialize};
use tamarind_auth::{AuthError, HostLoginIn, HostRegisterIn};
use tamarind_common::{
    error::{HOST_LOGIN_ERROR, HOST_REGISTER_ERROR, SERVER_ERROR},
    operation, sanitize_log_value,
};
use tracing::{info, warn};

use crate::{
    api::request_details,
    model::{AppState, Result},
};

/// Body returned by a successful login
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostLoginOut {
    pub host_id: String,
    pub name: String,
    pub tags: Vec<String>,
}

#[post("/host/register")]
pub async fn register(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<HostRegisterIn>,
) -> impl Responder {
    let body = body.into_inner();

    let mut details = request_details(&req).with("host.name", body.name.as_str());
    details.insert_rendered("host.tags", &body.tags);
    data.audit()
        .emit(data.audit().topic(), operation::HOST_REGISTER, details);

    match data.auth.generate_api_key(&body.name, &body.tags).await {
        Ok(credentials) => Result::<()>::http_success(credentials),
        Err(AuthError::InvalidName(reason)) => {
            info!(host = %sanitize_log_value(&body.name), "host register rejected: {}", reason);
            Result::<()>::http_response(400, HOST_REGISTER_ERROR.code, reason, ())
        }
        Err(e) => {
            warn!("host register failed: {}", e);
            Result::<()>::http_error(500, SERVER_ERROR)
        }
    }
}

#[post("/host/login")]
pub async fn login(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<HostLoginIn>,
) -> impl Responder {
    let body = body.into_inner();

    let details = request_details(&req).with("host", body.host.as_str());
    data.audit()
        .emit(data.audit().topic(), operation::HOST_LOGIN, details);

    match data.auth.get_api_key(&body.host, &body.apikey).await {
        Ok(record) => Result::<()>::http_success(HostLoginOut {
            host_id: record.host_id,
            name: record.name,
            tags: record.tags,
        }),
        Err(AuthError::Backend(e)) => {
            warn!("host login failed: {}", e);
            Result::<()>::http_error(500, SERVER_ERROR)
        }
        Err(e) => {
            info!(host_id = %sanitize_log_value(&body.host), "host login rejected: {}", e);
            Result::<()>::http_error(401, HOST_LOGIN_ERROR)
        }
    }
}
