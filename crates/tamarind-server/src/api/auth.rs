// Host authentication extractor
// Validates `Authorization: Bearer <api key>` together with the host id header

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError, http::header,
    web,
};
use futures::future::LocalBoxFuture;
use tamarind_common::{
    error::{ACCESS_DENIED, PARAMETER_MISSING, SERVER_ERROR},
    sanitize_log_value,
};
use tracing::info;

use crate::model::{AppState, Result};

pub const HOST_ID_HEADER: &str = "X-Host-Id";
const LEGACY_HOST_ID_HEADER: &str = "HostID";
const BEARER_PREFIX: &str = "Bearer ";

/// A host whose API key checked out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedHost {
    pub host_id: String,
    pub name: String,
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extract the bearer token and host id
fn extract_credentials(req: &HttpRequest) -> Option<(String, String)> {
    let token = header_value(req, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|v| !v.is_empty())?;
    let host_id = header_value(req, HOST_ID_HEADER)
        .or_else(|| header_value(req, LEGACY_HOST_ID_HEADER))?;

    Some((token.to_string(), host_id.to_string()))
}

fn reject(status: u16, code: i32, message: &'static str) -> actix_web::Error {
    let response: HttpResponse =
        Result::<()>::http_response(status, code, message.to_string(), ());
    InternalError::from_response(message, response).into()
}

impl FromRequest for AuthenticatedHost {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let credentials = extract_credentials(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state =
                state.ok_or_else(|| reject(500, SERVER_ERROR.code, "application state missing"))?;
            let (token, host_id) = credentials
                .ok_or_else(|| reject(401, PARAMETER_MISSING.code, "unauthorized"))?;

            match state.auth.validate_api_key(&host_id, &token).await {
                Ok(name) => Ok(AuthenticatedHost { host_id, name }),
                Err(e) => {
                    info!(host_id = %sanitize_log_value(&host_id), "auth failed: {}", e);
                    Err(reject(401, ACCESS_DENIED.code, "unauthorized"))
                }
            }
        })
    }
}
