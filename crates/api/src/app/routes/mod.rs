use axum::{Router, routing::get};

pub mod pies;
pub mod system;

/// Router for all pie endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/hello_world", get(system::hello_world))
        .nest("/pies", pies::router())
}
