pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as tailoring;
use crate::resume::handlers as validation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tailoring API
        .route("/api/v1/backend", get(tailoring::handle_backend_info))
        .route("/api/v1/tailor", post(tailoring::handle_tailor))
        .route("/api/v1/tailor/batch", post(tailoring::handle_tailor_batch))
        // Validation API
        .route("/api/v1/validate", post(validation::handle_validate))
        .route(
            "/api/v1/validate/master",
            get(validation::handle_validate_master),
        )
        .route(
            "/api/v1/validate/tailored",
            post(validation::handle_validate_tailored),
        )
        .with_state(state)
}
