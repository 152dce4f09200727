//! HTTP server setup

use actix_web::{
    App, Error, HttpServer,
    body::MessageBody,
    dev::{Server, ServiceRequest, ServiceResponse},
    middleware::{Compress, Logger, Next, from_fn},
    web,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::{api::route::routes, metrics::record_http_request, model::AppState};

/// Count every request by method, matched route and status
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().to_string();
    let route = req
        .request()
        .match_pattern()
        .unwrap_or_else(|| "unmatched".to_string());

    let res = next.call(req).await?;
    record_http_request(&method, &route, res.status().as_u16());
    Ok(res)
}

/// Creates and binds the main HTTP server
pub fn main_server(
    app_state: web::Data<AppState>,
    prometheus: Option<PrometheusHandle>,
    address: String,
    port: u16,
) -> Result<Server, std::io::Error> {
    let prometheus = prometheus.map(web::Data::new);

    Ok(HttpServer::new(move || {
        let mut app = App::new()
            .wrap(from_fn(track_requests))
            .wrap(Compress::default())
            .wrap(Logger::default())
            .app_data(app_state.clone());
        if let Some(handle) = &prometheus {
            app = app.app_data(handle.clone());
        }
        app.configure(routes)
    })
    .bind((address, port))?
    .run())
}
