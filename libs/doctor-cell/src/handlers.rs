use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::AppError;
use shared_utils::state::AppState;

use crate::models::{DoctorError, GenerateSlotsRequest, SlotListing};
use crate::services::{availability::AvailabilityService, slots::SlotGenerator};

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound(id) => AppError::NotFound(format!("Doctor not found: {}", id)),
            DoctorError::InvalidGranularity(_)
            | DoctorError::MalformedRange(_)
            | DoctorError::EmptyRange(_) => AppError::BadRequest(e.to_string()),
            DoctorError::Backend(msg) => AppError::ExternalService(msg),
        }
    }
}

/// Slots for caller-supplied rules. Pure computation, no backend call.
#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<Json<SlotListing>, AppError> {
    let generator = match request.granularity_minutes {
        Some(minutes) => SlotGenerator::new(minutes)?,
        None => SlotGenerator::from_settings(&state.config.booking),
    };

    let slots = generator.generate(&request.rules, request.date);
    debug!("Generated {} slots for {}", slots.len(), request.date);

    Ok(Json(SlotListing::new(request.date, &slots)))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state.config);

    let rules = availability_service.get_rules(&doctor_id, None).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability": rules,
        "granularity_minutes": availability_service.generator().granularity_minutes(),
    })))
}
