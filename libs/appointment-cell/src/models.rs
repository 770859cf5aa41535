// libs/appointment-cell/src/models.rs
use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::{hhmm, DoctorError};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Appointment as returned by the backend. Read-only here: it is classified
/// and used to exclude taken slots, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub patient: String,
    #[serde(with = "iso_date")]
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(rename = "type", default)]
    pub appointment_type: String,
    #[serde(default)]
    pub mode: AppointmentMode,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Pending,
    Completed,
    Cancelled,
    Urgent,
    /// Anything the backend sends that isn't recognised.
    Unknown(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Urgent => "urgent",
            AppointmentStatus::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Urgent => "Urgent",
            AppointmentStatus::Unknown(_) => "Unknown",
        }
    }
}

impl From<&str> for AppointmentStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "scheduled" => AppointmentStatus::Scheduled,
            "confirmed" => AppointmentStatus::Confirmed,
            "pending" => AppointmentStatus::Pending,
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            "urgent" => AppointmentStatus::Urgent,
            _ => AppointmentStatus::Unknown(raw.to_string()),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AppointmentStatus::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentMode {
    #[default]
    #[serde(alias = "in-person", alias = "inPerson", alias = "physical", alias = "clinic")]
    InPerson,
    #[serde(alias = "virtual", alias = "online", alias = "telehealth")]
    Video,
    #[serde(alias = "call")]
    Phone,
    #[serde(alias = "home-visit", alias = "homeVisit", alias = "home")]
    HomeVisit,
}

// ==============================================================================
// BOOKING DRAFT MODELS
// ==============================================================================

pub const DEFAULT_APPOINTMENT_TYPE: &str = "consultation";

/// In-progress booking form. Owned by a single wizard; never persisted
/// until submitted as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingDraft {
    #[serde(with = "iso_date::option")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(with = "hhmm::option")]
    pub appointment_time: Option<NaiveTime>,
    pub reason_for_visit: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub mode: AppointmentMode,
    pub notes: String,
    pub location: String,
    pub payment_reference: String,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            appointment_date: None,
            appointment_time: None,
            reason_for_visit: String::new(),
            appointment_type: DEFAULT_APPOINTMENT_TYPE.to_string(),
            mode: AppointmentMode::default(),
            notes: String::new(),
            location: String::new(),
            payment_reference: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    AppointmentDate,
    AppointmentTime,
    ReasonForVisit,
    #[serde(rename = "type")]
    AppointmentType,
    Mode,
    Notes,
    Location,
    PaymentReference,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::AppointmentDate => "appointmentDate",
            DraftField::AppointmentTime => "appointmentTime",
            DraftField::ReasonForVisit => "reasonForVisit",
            DraftField::AppointmentType => "type",
            DraftField::Mode => "mode",
            DraftField::Notes => "notes",
            DraftField::Location => "location",
            DraftField::PaymentReference => "paymentReference",
        };
        write!(f, "{}", name)
    }
}

/// Payload sent to the appointment-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub doctor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(flatten)]
    pub draft: BookingDraft,
    /// Sent as a header, not in the body.
    #[serde(skip)]
    pub submission_id: Uuid,
}

impl BookingRequest {
    pub fn new(doctor_id: impl Into<String>, draft: BookingDraft) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            patient_id: None,
            draft,
            submission_id: Uuid::new_v4(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: Option<String>,
    pub appointment_id: Option<String>,
}

// ==============================================================================
// DISPLAY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Blue,
    Green,
    Yellow,
    Gray,
    Red,
    Orange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDisplay {
    pub badge_color: BadgeColor,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentClassification {
    pub badge_color: BadgeColor,
    pub label: String,
    pub is_past: bool,
    pub is_cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient toast surfaced to the user; the UI dismisses it after `dismiss_after`.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub dismiss_after: Duration,
}

impl Notification {
    pub fn success(message: impl Into<String>, dismiss_after: Duration) -> Self {
        Self { kind: NotificationKind::Success, message: message.into(), dismiss_after }
    }

    pub fn error(message: impl Into<String>, dismiss_after: Duration) -> Self {
        Self { kind: NotificationKind::Error, message: message.into(), dismiss_after }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Availability error: {0}")]
    Availability(#[from] DoctorError),

    #[error("Appointment service error: {0}")]
    Backend(String),
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

/// `NaiveDate` <-> `"YYYY-MM-DD"`; full ISO timestamps are accepted and truncated.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(crate) fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
                None => serializer.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => super::parse(value)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", value))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(AppointmentStatus::from("CONFIRMED"), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::from("canceled"), AppointmentStatus::Cancelled);
        assert_eq!(
            AppointmentStatus::from("rescheduled"),
            AppointmentStatus::Unknown("rescheduled".to_string())
        );
    }

    #[test]
    fn appointment_accepts_backend_shape() {
        let appointment: Appointment = serde_json::from_value(json!({
            "_id": "apt-1",
            "doctor": "doc-1",
            "patient": "pat-1",
            "appointmentDate": "2026-10-19T00:00:00.000Z",
            "appointmentTime": "09:30",
            "status": "Scheduled",
            "type": "follow-up",
            "mode": "virtual"
        }))
        .unwrap();

        assert_eq!(appointment.id, "apt-1");
        assert_eq!(appointment.appointment_date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.mode, AppointmentMode::Video);
        assert_eq!(appointment.notes, None);
    }

    #[test]
    fn empty_draft_serialises_blank_fields() {
        let value = serde_json::to_value(BookingDraft::default()).unwrap();
        assert_eq!(value["appointmentDate"], "");
        assert_eq!(value["appointmentTime"], "");
        assert_eq!(value["type"], "consultation");
        assert_eq!(value["mode"], "in_person");
    }

    #[test]
    fn booking_request_flattens_draft() {
        let draft = BookingDraft {
            appointment_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            appointment_time: NaiveTime::from_hms_opt(9, 30, 0),
            reason_for_visit: "Routine checkup".to_string(),
            ..BookingDraft::default()
        };
        let value = serde_json::to_value(BookingRequest::new("doc-1", draft)).unwrap();

        assert_eq!(value["doctorId"], "doc-1");
        assert_eq!(value["appointmentDate"], "2026-10-19");
        assert_eq!(value["appointmentTime"], "09:30");
        assert!(value.get("patientId").is_none());
        assert!(value.get("submissionId").is_none());
    }

    #[test]
    fn draft_reads_blank_strings_as_missing() {
        let draft: BookingDraft = serde_json::from_value(json!({
            "appointmentDate": "",
            "appointmentTime": " ",
            "reasonForVisit": "Headache for a week"
        }))
        .unwrap();

        assert_eq!(draft.appointment_date, None);
        assert_eq!(draft.appointment_time, None);
        assert_eq!(draft.appointment_type, DEFAULT_APPOINTMENT_TYPE);
    }
}
