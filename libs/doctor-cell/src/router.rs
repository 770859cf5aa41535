use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_utils::state::AppState;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/slots", post(handlers::generate_slots))
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability))
        .with_state(state)
}
