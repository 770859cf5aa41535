// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use doctor_cell::models::SlotListing;
use doctor_cell::services::availability::AvailabilityService;
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_utils::state::AppState;

use crate::models::{
    iso_date, Appointment, AppointmentClassification, AppointmentError, BookingDraft,
    BookingRequest,
};
use crate::services::classifier::classify;
use crate::services::directory::AppointmentDirectory;
use crate::services::submission::{AppointmentSubmitter, RestAppointmentSubmitter};
use crate::services::wizard::{validate_draft_details, SlotAvailability};

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Availability(inner) => inner.into(),
            AppointmentError::Backend(msg) => AppError::ExternalService(msg),
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

// ==============================================================================
// REQUEST STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub doctor_id: String,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentBody {
    pub doctor_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(flatten)]
    pub draft: BookingDraft,
}

async fn load_availability(
    state: &AppState,
    doctor_id: &str,
    date: NaiveDate,
    auth_token: Option<&str>,
) -> Result<SlotAvailability, AppError> {
    let availability_service = AvailabilityService::new(&state.config);
    let rules = availability_service.get_rules(doctor_id, auth_token).await?;
    let booked = AppointmentDirectory::new(&state.config)
        .for_doctor_on(doctor_id, date, auth_token)
        .await?;

    Ok(SlotAvailability::new(rules, booked, *availability_service.generator()))
}

// ==============================================================================
// HANDLERS
// ==============================================================================

/// Badge, label and past/cancelled flags for each appointment, in input order.
#[axum::debug_handler]
pub async fn classify_appointments(
    Json(appointments): Json<Vec<Appointment>>,
) -> Json<Vec<AppointmentClassification>> {
    let now = local_now();
    Json(appointments.iter().map(|apt| classify(apt, now)).collect())
}

/// Bookable slots for a doctor on a date, minus booked and already-passed times.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<SlotListing>, AppError> {
    let availability = load_availability(&state, &query.doctor_id, query.date, None).await?;
    let slots = availability.slots_for(query.date, local_now());

    debug!("Doctor {} has {} open slots on {}", query.doctor_id, slots.len(), query.date);
    Ok(Json(SlotListing::new(query.date, &slots)))
}

/// Validates the details step server-side, then forwards the booking.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<BookAppointmentBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = session.token.as_str();
    let now = local_now();

    let availability = match body.draft.appointment_date {
        Some(date) => load_availability(&state, &body.doctor_id, date, Some(token)).await?,
        None => SlotAvailability::default(),
    };

    let errors = validate_draft_details(
        &body.draft,
        &availability,
        now,
        state.config.booking.min_reason_length,
    );
    if !errors.is_empty() {
        debug!("Rejected booking for doctor {}: {}", body.doctor_id, errors.summary());
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "message": "Please fix the highlighted fields",
                "errors": errors,
            })),
        ));
    }

    // Patients always book for themselves.
    let patient_id = if session.has_role(Role::Patient) {
        Some(session.user.id.clone())
    } else {
        body.patient_id
    };

    let mut request = BookingRequest::new(body.doctor_id, body.draft);
    request.patient_id = patient_id;

    let submitter = RestAppointmentSubmitter::new(&state.config, Some(session.token.clone()));
    let response = submitter.submit(&request).await?;

    if !response.success {
        return Err(AppError::Conflict(
            response.message.unwrap_or_else(|| "Appointment could not be booked".to_string()),
        ));
    }

    info!("User {} booked appointment {:?}", session.user.id, response.appointment_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointmentId": response.appointment_id,
            "message": response.message.unwrap_or_else(|| "Appointment booked successfully".to_string()),
        })),
    ))
}
