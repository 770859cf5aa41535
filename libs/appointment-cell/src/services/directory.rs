// libs/appointment-cell/src/services/directory.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::BackendClient;

use crate::models::{Appointment, AppointmentError};

#[derive(Deserialize)]
#[serde(untagged)]
enum AppointmentsPayload {
    List(Vec<Appointment>),
    Wrapped { appointments: Vec<Appointment> },
}

/// Read-only lookup of existing appointments, used to find taken slots.
pub struct AppointmentDirectory {
    backend: BackendClient,
}

impl AppointmentDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    pub async fn for_doctor_on(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/appointments?doctorId={}&date={}",
            urlencoding::encode(doctor_id),
            date.format("%Y-%m-%d")
        );

        let payload: AppointmentsPayload = self.backend
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::Backend(e.to_string()))?;

        let appointments = match payload {
            AppointmentsPayload::List(list) => list,
            AppointmentsPayload::Wrapped { appointments } => appointments,
        };

        // Backends that ignore the date filter still get the right answer.
        let appointments: Vec<Appointment> = appointments
            .into_iter()
            .filter(|apt| apt.appointment_date == date)
            .collect();

        debug!("Doctor {} has {} appointments on {}", doctor_id, appointments.len(), date);
        Ok(appointments)
    }
}
