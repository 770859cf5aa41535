use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::BackendClient;

use crate::models::{AvailabilityRule, BookableSlot, DoctorError};
use crate::services::slots::SlotGenerator;

/// Backends answer either with a bare rule array or `{ "availability": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AvailabilityPayload {
    Rules(Vec<AvailabilityRule>),
    Wrapped { availability: Vec<AvailabilityRule> },
}

impl AvailabilityPayload {
    fn into_rules(self) -> Vec<AvailabilityRule> {
        match self {
            AvailabilityPayload::Rules(rules) => rules,
            AvailabilityPayload::Wrapped { availability } => availability,
        }
    }
}

/// Doctor availability lookup. Produces the theoretical schedule; callers
/// that show slots to a patient still have to drop times that are already
/// booked.
pub struct AvailabilityService {
    backend: BackendClient,
    generator: SlotGenerator,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
            generator: SlotGenerator::from_settings(&config.booking),
        }
    }

    pub fn generator(&self) -> &SlotGenerator {
        &self.generator
    }

    /// Fetch the weekly availability rules for a doctor.
    pub async fn get_rules(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<AvailabilityRule>, DoctorError> {
        debug!("Fetching availability rules for doctor: {}", doctor_id);

        let path = format!("/doctors/{}/availability", urlencoding::encode(doctor_id));
        let payload: AvailabilityPayload = self.backend
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.starts_with("Resource not found") {
                    DoctorError::NotFound(doctor_id.to_string())
                } else {
                    DoctorError::Backend(message)
                }
            })?;

        let rules = payload.into_rules();
        debug!("Doctor {} has {} availability rules", doctor_id, rules.len());
        Ok(rules)
    }

    /// Theoretical slots for `date`, before any booked-time exclusion.
    pub async fn get_slots_for_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<BookableSlot>, DoctorError> {
        let rules = self.get_rules(doctor_id, auth_token).await?;
        Ok(self.generator.generate(&rules, date))
    }
}
