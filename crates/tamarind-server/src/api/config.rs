//! Config API handlers
//!
//! - POST /api/v1/config - insert a version into the caller's scope
//! - GET /api/v1/config/{config_id} - read by id or name, any host
//! - PATCH /api/v1/config/{config_id} - append a version by id
//! - GET /api/v1/config/{config_id}/history - version records
//! - GET /api/v1/host/{host_id}/config/{config_id} - read within a host
//! - GET /api/v1/configs - page through configs

use actix_web::{HttpRequest, Responder, get, patch, post, web};
use serde::{Deserialize, Serialize};
use tamarind_common::error::ACCESS_DENIED;
use tamarind_config::{ConfigIn, ConfigResponse, ConfigVersionResponse, UpdateConfigIn};

use crate::{
    api::{auth::AuthenticatedHost, request_details},
    model::{AppState, Result, response::config_error_response},
};

/// Query of the list route; parsed by the repository
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

#[post("/config")]
pub async fn insert_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    host: AuthenticatedHost,
    body: web::Json<ConfigIn>,
) -> impl Responder {
    let details = request_details(&req);

    match data
        .repository
        .insert(body.into_inner(), Some(&host.host_id), &details)
        .await
    {
        Ok(outcome) => Result::<()>::http_success(outcome),
        Err(e) => config_error_response(&e),
    }
}

#[get("/config/{config_id}")]
pub async fn get_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    _host: AuthenticatedHost,
    path: web::Path<String>,
) -> impl Responder {
    let details = request_details(&req);

    match data.repository.get(&path, None, &details).await {
        Ok(doc) => Result::<()>::http_success(ConfigResponse::from(doc)),
        Err(e) => config_error_response(&e),
    }
}

#[patch("/config/{config_id}")]
pub async fn update_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    _host: AuthenticatedHost,
    path: web::Path<String>,
    body: web::Json<UpdateConfigIn>,
) -> impl Responder {
    let details = request_details(&req);

    match data
        .repository
        .update_by_id(&path, body.into_inner(), &details)
        .await
    {
        Ok(outcome) => Result::<()>::http_success(outcome),
        Err(e) => config_error_response(&e),
    }
}

#[get("/config/{config_id}/history")]
pub async fn config_history(
    req: HttpRequest,
    data: web::Data<AppState>,
    _host: AuthenticatedHost,
    path: web::Path<String>,
) -> impl Responder {
    let details = request_details(&req);

    match data.repository.history(&path, &details).await {
        Ok(records) => Result::<()>::http_success(
            records
                .into_iter()
                .map(ConfigVersionResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => config_error_response(&e),
    }
}

/// Hosts may only read their own scope
#[get("/host/{host_id}/config/{config_id}")]
pub async fn get_host_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    host: AuthenticatedHost,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (host_id, config_id) = path.into_inner();
    if host_id != host.host_id {
        return Result::<()>::http_error(403, ACCESS_DENIED);
    }
    let details = request_details(&req);

    match data
        .repository
        .get(&config_id, Some(&host_id), &details)
        .await
    {
        Ok(doc) => Result::<()>::http_success(ConfigResponse::from(doc)),
        Err(e) => config_error_response(&e),
    }
}

#[get("/configs")]
pub async fn list_configs(
    req: HttpRequest,
    data: web::Data<AppState>,
    _host: AuthenticatedHost,
    params: web::Query<PageParams>,
) -> impl Responder {
    let details = request_details(&req);

    match data
        .repository
        .list(params.offset.as_deref(), params.limit.as_deref(), &details)
        .await
    {
        Ok(page) => Result::<()>::http_success(page),
        Err(e) => config_error_response(&e),
    }
}
