// libs/appointment-cell/src/services/submission.rs
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::BackendClient;

use crate::models::{AppointmentError, BookingRequest, SubmissionResponse};

/// Sends a completed booking to whatever owns appointment records.
#[async_trait]
pub trait AppointmentSubmitter: Send + Sync {
    async fn submit(&self, request: &BookingRequest) -> Result<SubmissionResponse, AppointmentError>;
}

/// Posts bookings to `POST /appointments` on the backend.
///
/// Each request carries its `submission_id` as `X-Request-Id` so the backend
/// can recognise a duplicate.
#[derive(Clone)]
pub struct RestAppointmentSubmitter {
    backend: BackendClient,
    auth_token: Option<String>,
}

impl RestAppointmentSubmitter {
    pub fn new(config: &AppConfig, auth_token: Option<String>) -> Self {
        Self {
            backend: BackendClient::new(config),
            auth_token,
        }
    }
}

#[async_trait]
impl AppointmentSubmitter for RestAppointmentSubmitter {
    async fn submit(&self, request: &BookingRequest) -> Result<SubmissionResponse, AppointmentError> {
        debug!("Submitting booking {} for doctor {}", request.submission_id, request.doctor_id);

        let body = serde_json::to_value(request)
            .map_err(|e| AppointmentError::ValidationError(format!("Unserialisable booking: {}", e)))?;

        let mut headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(&request.submission_id.to_string())
            .map_err(|e| AppointmentError::Backend(e.to_string()))?;
        headers.insert("x-request-id", request_id);

        let response: SubmissionResponse = self.backend
            .request_with_headers(
                Method::POST,
                "/appointments",
                self.auth_token.as_deref(),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| {
                warn!("Booking submission {} failed: {}", request.submission_id, e);
                AppointmentError::Backend(e.to_string())
            })?;

        if response.success {
            info!(
                "Booking {} accepted, appointment id {:?}",
                request.submission_id, response.appointment_id
            );
        } else {
            warn!(
                "Booking {} rejected: {}",
                request.submission_id,
                response.message.as_deref().unwrap_or("no reason given")
            );
        }

        Ok(response)
    }
}
