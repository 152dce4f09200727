//! HTTP response envelope
//!
//! Every route answers with `{ "code", "message", "data" }`.

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::{Deserialize, Serialize};
use tamarind_common::{ConfigError, ErrorCode, Outcome, error::SUCCESS};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: SUCCESS.code,
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(StatusCode::from_u16(status).unwrap_or_default())
            .json(Result::new(code, message, data))
    }

    /// Error response with the message of an error code
    pub fn http_error(status: u16, error: ErrorCode<'_>) -> HttpResponse {
        Self::http_response(status, error.code, error.message.to_string(), ())
    }
}

/// HTTP status for the failure class of a repository error
pub fn status_of(err: &ConfigError) -> u16 {
    match err.outcome() {
        Outcome::NotFound => StatusCode::NOT_FOUND.as_u16(),
        Outcome::BadRequest => StatusCode::BAD_REQUEST.as_u16(),
        Outcome::Internal => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
    }
}

/// Error envelope for a repository error
///
/// Internal failures only expose the error code message; store and cache
/// details stay in the logs.
pub fn config_error_response(err: &ConfigError) -> HttpResponse {
    let code = err.error_code();
    let message = match err.outcome() {
        Outcome::Internal => code.message.to_string(),
        _ => err.to_string(),
    };
    Result::<()>::http_response(status_of(err), code.code, message, ())
}
