use axum::{Router, routing::get};

use crate::handlers::{health_handler, metrics_handler, profile_by_path_handler, profile_by_query_handler};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/user", get(profile_by_query_handler))
        .route("/api/users/{id}", get(profile_by_path_handler))
        .with_state(state)
}
