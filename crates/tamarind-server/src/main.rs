//! Main entry point for the Tamarind config store server.

use actix_web::web;
use tamarind_server::{
    metrics,
    model::Configuration,
    startup::{self, shutdown::DRAIN_TIMEOUT},
};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new()?;

    let subscriber = startup::get_subscriber(
        &configuration.service_name(),
        &configuration.log_level(),
        std::io::stdout,
    );
    startup::init_subscriber(subscriber)?;

    let prometheus = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder not installed: {}", e);
            None
        }
    };
    metrics::init_metrics();

    let (app_state, audit_workers) = startup::build_app_state(&configuration)?;
    let app_state = web::Data::new(app_state);

    let address = configuration.server_address();
    let port = configuration.server_port();
    info!("Starting Tamarind server on {}:{}", address, port);

    startup::main_server(app_state.clone(), prometheus, address, port)?.await?;

    info!("HTTP server stopped");
    drop(app_state);
    startup::drain_audit(audit_workers, DRAIN_TIMEOUT).await;

    Ok(())
}
