//! Tamarind server
//!
//! HTTP front end over the config repository:
//! - `model` - configuration, shared state and the response envelope
//! - `api` - route handlers and request authentication
//! - `startup` - logging bootstrap, state wiring and the HTTP server
//! - `metrics` - metric descriptions and recording helpers

pub mod api;
pub mod metrics;
pub mod model;
pub mod startup;
