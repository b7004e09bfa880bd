//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend wiring (engine, recommender, catalog)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query/response DTOs
//! - `errors.rs`: error → status mapping

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    routes::router().layer(ServiceBuilder::new().layer(Extension(services)))
}
