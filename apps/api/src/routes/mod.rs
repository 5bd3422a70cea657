pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/catalogs/:language",
            get(handlers::handle_get_catalog),
        )
        .route("/api/v1/match", post(handlers::handle_match))
        .with_state(state)
}
