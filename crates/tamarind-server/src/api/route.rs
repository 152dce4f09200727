//! Route registration

use actix_web::{HttpRequest, error::InternalError, web};
use tamarind_common::error::PARAMETER_VALIDATE_ERROR;

use crate::model::Result;

use super::{config, health, host};

pub const API_PREFIX: &str = "/api/v1";

/// Malformed JSON bodies get the standard error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = err.to_string();
        let response = Result::<()>::http_response(
            400,
            PARAMETER_VALIDATE_ERROR.code,
            message.clone(),
            (),
        );
        InternalError::from_response(message, response).into()
    })
}

/// Register every route on an app or test service
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::render_metrics).service(
        web::scope(API_PREFIX)
            .app_data(json_config())
            .service(health::health)
            .service(host::register)
            .service(host::login)
            .service(config::get_host_config)
            .service(config::insert_config)
            .service(config::config_history)
            .service(config::get_config)
            .service(config::update_config)
            .service(config::list_configs),
    );
}
