//! Server startup
//!
//! - `telemetry` - tracing subscriber setup
//! - `state` - repository, cache, audit and auth wiring
//! - `http` - the actix-web server
//! - `shutdown` - draining audit events on exit

pub mod http;
pub mod shutdown;
pub mod state;
pub mod telemetry;

pub use http::main_server;
pub use shutdown::drain_audit;
pub use state::build_app_state;
pub use telemetry::{get_subscriber, init_subscriber};
