// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::session_middleware;
use shared_utils::state::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/classify", post(handlers::classify_appointments))
        .route("/available-slots", get(handlers::get_available_slots));

    // Booking requires a signed-in session
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
