// libs/appointment-cell/src/services/wizard.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info};

use doctor_cell::models::{AvailabilityRule, BookableSlot};
use doctor_cell::services::slots::SlotGenerator;

use crate::models::{Appointment, AppointmentMode, BookingDraft, DraftField};
use crate::services::classifier::exclude_unavailable;

pub const DEFAULT_MIN_REASON_LENGTH: usize = 5;

// ==============================================================================
// AVAILABILITY CONTEXT
// ==============================================================================

/// Everything needed to decide which times a patient may pick for one doctor.
#[derive(Debug, Clone, Default)]
pub struct SlotAvailability {
    pub rules: Vec<AvailabilityRule>,
    pub booked: Vec<Appointment>,
    pub generator: SlotGenerator,
}

impl SlotAvailability {
    pub fn new(rules: Vec<AvailabilityRule>, booked: Vec<Appointment>, generator: SlotGenerator) -> Self {
        Self { rules, booked, generator }
    }

    /// Generated slots for `date` with booked and already-passed times removed.
    pub fn slots_for(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<BookableSlot> {
        let generated = self.generator.generate(&self.rules, date);
        exclude_unavailable(generated, date, now, &self.booked)
    }
}

// ==============================================================================
// WIZARD STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Details = 1,
    Preferences = 2,
    Review = 3,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::Details => Some(WizardStep::Preferences),
            WizardStep::Preferences => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Details => None,
            WizardStep::Preferences => Some(WizardStep::Details),
            WizardStep::Review => Some(WizardStep::Preferences),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Details => "details",
            WizardStep::Preferences => "preferences",
            WizardStep::Review => "review",
        };
        write!(f, "{} (step {})", name, self.number())
    }
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    AppointmentDate(Option<NaiveDate>),
    AppointmentTime(Option<NaiveTime>),
    ReasonForVisit(String),
    AppointmentType(String),
    Mode(AppointmentMode),
    Notes(String),
    Location(String),
    PaymentReference(String),
}

impl FieldUpdate {
    pub fn field(&self) -> DraftField {
        match self {
            FieldUpdate::AppointmentDate(_) => DraftField::AppointmentDate,
            FieldUpdate::AppointmentTime(_) => DraftField::AppointmentTime,
            FieldUpdate::ReasonForVisit(_) => DraftField::ReasonForVisit,
            FieldUpdate::AppointmentType(_) => DraftField::AppointmentType,
            FieldUpdate::Mode(_) => DraftField::Mode,
            FieldUpdate::Notes(_) => DraftField::Notes,
            FieldUpdate::Location(_) => DraftField::Location,
            FieldUpdate::PaymentReference(_) => DraftField::PaymentReference,
        }
    }
}

/// Field-scoped validation messages, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<DraftField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: DraftField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn clear_field(&mut self, field: DraftField) -> bool {
        self.0.remove(&field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DraftField, &String)> {
        self.0.iter()
    }

    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("Booking details are incomplete: {}", .0.summary())]
    ValidationFailed(ValidationErrors),

    #[error("Already at the review step; submit the booking instead")]
    AlreadyAtReview,
}

// ==============================================================================
// WIZARD
// ==============================================================================

/// Three-step booking form: details -> preferences -> review.
///
/// Only the details step is gated. Moving back never validates. Submission is
/// owned by `BookingFlow`, not by the wizard.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
    errors: ValidationErrors,
    availability: SlotAvailability,
    available_slots: Vec<BookableSlot>,
    min_reason_length: usize,
}

impl BookingWizard {
    pub fn open(availability: SlotAvailability) -> Self {
        Self {
            step: WizardStep::Details,
            draft: BookingDraft::default(),
            errors: ValidationErrors::default(),
            availability,
            available_slots: Vec::new(),
            min_reason_length: DEFAULT_MIN_REASON_LENGTH,
        }
    }

    pub fn with_min_reason_length(mut self, min_reason_length: usize) -> Self {
        self.min_reason_length = min_reason_length;
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Times offered for the currently selected date.
    pub fn available_slots(&self) -> &[BookableSlot] {
        &self.available_slots
    }

    /// Apply one edit. The edited field's error is dropped immediately, without
    /// re-validating.
    pub fn update(&mut self, update: FieldUpdate, now: NaiveDateTime) {
        let field = update.field();
        if self.errors.clear_field(field) {
            debug!("Cleared validation error on {}", field);
        }

        match update {
            FieldUpdate::AppointmentDate(date) => self.change_date(date, now),
            FieldUpdate::AppointmentTime(time) => self.draft.appointment_time = time,
            FieldUpdate::ReasonForVisit(reason) => self.draft.reason_for_visit = reason,
            FieldUpdate::AppointmentType(appointment_type) => self.draft.appointment_type = appointment_type,
            FieldUpdate::Mode(mode) => self.draft.mode = mode,
            FieldUpdate::Notes(notes) => self.draft.notes = notes,
            FieldUpdate::Location(location) => self.draft.location = location,
            FieldUpdate::PaymentReference(reference) => self.draft.payment_reference = reference,
        }
    }

    /// DATE_CHANGE_RESETS_TIME: picking a different date always clears the
    /// chosen time and recomputes the offered slots.
    fn change_date(&mut self, date: Option<NaiveDate>, now: NaiveDateTime) {
        if self.draft.appointment_date == date {
            return;
        }

        self.draft.appointment_date = date;
        if self.draft.appointment_time.take().is_some() {
            debug!("Appointment date changed; cleared selected time");
            self.errors.clear_field(DraftField::AppointmentTime);
        }

        self.available_slots = match date {
            Some(date) => self.availability.slots_for(date, now),
            None => Vec::new(),
        };
    }

    /// Swap in fresh availability (e.g. after re-fetching bookings). A chosen
    /// time that is no longer offered is cleared.
    pub fn refresh_availability(&mut self, availability: SlotAvailability, now: NaiveDateTime) {
        self.availability = availability;
        self.available_slots = match self.draft.appointment_date {
            Some(date) => self.availability.slots_for(date, now),
            None => Vec::new(),
        };

        if let Some(time) = self.draft.appointment_time {
            if !self.available_slots.iter().any(|slot| slot.time == time) {
                info!("Selected time {} is no longer available; clearing it", time.format("%H:%M"));
                self.draft.appointment_time = None;
            }
        }
    }

    /// Checks the details step against `now` without changing state.
    pub fn validate_details(&self, now: NaiveDateTime) -> ValidationErrors {
        validate_draft_details(&self.draft, &self.availability, now, self.min_reason_length)
    }

    /// Move forward one step. Leaving details requires a clean validation;
    /// on failure the errors are stored and the step is unchanged.
    pub fn advance(&mut self, now: NaiveDateTime) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Details => {
                let errors = self.validate_details(now);
                if !errors.is_empty() {
                    debug!("Details step blocked: {}", errors.summary());
                    self.errors = errors.clone();
                    return Err(WizardError::ValidationFailed(errors));
                }
                self.errors = ValidationErrors::default();
                self.step = WizardStep::Preferences;
            }
            WizardStep::Preferences => self.step = WizardStep::Review,
            WizardStep::Review => return Err(WizardError::AlreadyAtReview),
        }

        debug!("Booking wizard advanced to {}", self.step);
        Ok(self.step)
    }

    /// Move back one step; a no-op on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Re-checks the details right before submission. Errors are stored so
    /// they show once the user goes back.
    pub fn ensure_submittable(&mut self, now: NaiveDateTime) -> Result<(), WizardError> {
        let errors = self.validate_details(now);
        if errors.is_empty() {
            return Ok(());
        }
        self.errors = errors.clone();
        Err(WizardError::ValidationFailed(errors))
    }
}

/// Details-step rules: a date not before today, a time offered for that date,
/// and a reason of at least `min_reason_length` characters once trimmed.
pub fn validate_draft_details(
    draft: &BookingDraft,
    availability: &SlotAvailability,
    now: NaiveDateTime,
    min_reason_length: usize,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let today = now.date();

    match draft.appointment_date {
        None => errors.insert(DraftField::AppointmentDate, "Please select an appointment date"),
        Some(date) if date < today => {
            errors.insert(DraftField::AppointmentDate, "Appointment date cannot be in the past")
        }
        Some(_) => {}
    }

    match (draft.appointment_time, draft.appointment_date) {
        (None, _) => errors.insert(DraftField::AppointmentTime, "Please select an appointment time"),
        (Some(time), Some(date)) if date >= today => {
            let offered = availability.slots_for(date, now);
            if !offered.iter().any(|slot| slot.time == time) {
                errors.insert(
                    DraftField::AppointmentTime,
                    "Selected time is not available on this date",
                );
            }
        }
        // The date error already explains why the time can't be checked.
        (Some(_), _) => {}
    }

    if draft.reason_for_visit.trim().chars().count() < min_reason_length {
        errors.insert(
            DraftField::ReasonForVisit,
            format!("Reason for visit must be at least {} characters", min_reason_length),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // 2026-10-19 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn early_monday() -> NaiveDateTime {
        monday().and_time(at(7, 0))
    }

    fn wizard() -> BookingWizard {
        let rules = vec![
            AvailabilityRule::new("Monday", &["09:00-11:00"]),
            AvailabilityRule::new("Tuesday", &["14:00-15:00"]),
        ];
        BookingWizard::open(SlotAvailability::new(rules, Vec::new(), SlotGenerator::default()))
    }

    fn fill_details(wizard: &mut BookingWizard, reason: &str) {
        let now = early_monday();
        wizard.update(FieldUpdate::AppointmentDate(Some(monday())), now);
        wizard.update(FieldUpdate::AppointmentTime(Some(at(9, 30))), now);
        wizard.update(FieldUpdate::ReasonForVisit(reason.to_string()), now);
    }

    #[test]
    fn opens_empty_at_details() {
        let wizard = wizard();
        assert_eq!(wizard.step(), WizardStep::Details);
        assert_eq!(wizard.draft(), &BookingDraft::default());
        assert!(wizard.available_slots().is_empty());
    }

    #[test]
    fn short_reason_blocks_with_single_error() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Flu!");

        let result = wizard.advance(early_monday());

        assert_matches!(result, Err(WizardError::ValidationFailed(ref errors)) if errors.len() == 1);
        assert_eq!(wizard.step(), WizardStep::Details);
        assert_eq!(wizard.errors().len(), 1);
        assert!(wizard.errors().get(DraftField::ReasonForVisit).is_some());
    }

    #[test]
    fn reason_is_trimmed_before_counting() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "   abcd   ");
        assert!(wizard.advance(early_monday()).is_err());

        wizard.update(FieldUpdate::ReasonForVisit("  abcde ".to_string()), early_monday());
        assert_eq!(wizard.advance(early_monday()), Ok(WizardStep::Preferences));
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let mut wizard = wizard();
        let err = wizard.advance(early_monday()).unwrap_err();
        assert_matches!(err, WizardError::ValidationFailed(errors) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.get(DraftField::AppointmentDate).is_some());
            assert!(errors.get(DraftField::AppointmentTime).is_some());
            assert!(errors.get(DraftField::ReasonForVisit).is_some());
        });
    }

    #[test]
    fn past_date_is_rejected() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");

        let next_day = monday().succ_opt().unwrap().and_time(at(7, 0));
        let errors = wizard.validate_details(next_day);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(DraftField::AppointmentDate),
            Some("Appointment date cannot be in the past")
        );
    }

    #[test]
    fn today_is_allowed() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");
        assert!(wizard.validate_details(early_monday()).is_empty());
    }

    #[test]
    fn time_outside_generated_slots_is_rejected() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");
        wizard.update(FieldUpdate::AppointmentTime(Some(at(11, 0))), early_monday());

        let errors = wizard.validate_details(early_monday());
        assert_eq!(errors.len(), 1);
        assert!(errors.get(DraftField::AppointmentTime).is_some());
    }

    #[test]
    fn changing_date_clears_time() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");
        assert_eq!(wizard.draft().appointment_time, Some(at(9, 30)));
        assert_eq!(wizard.available_slots().len(), 4);

        let tuesday = monday().succ_opt().unwrap();
        wizard.update(FieldUpdate::AppointmentDate(Some(tuesday)), early_monday());

        assert_eq!(wizard.draft().appointment_time, None);
        assert_eq!(wizard.available_slots().len(), 2);
    }

    #[test]
    fn same_date_keeps_time() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");
        wizard.update(FieldUpdate::AppointmentDate(Some(monday())), early_monday());
        assert_eq!(wizard.draft().appointment_time, Some(at(9, 30)));
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut wizard = wizard();
        let _ = wizard.advance(early_monday());
        assert_eq!(wizard.errors().len(), 3);

        wizard.update(FieldUpdate::ReasonForVisit("x".to_string()), early_monday());
        assert_eq!(wizard.errors().len(), 2);
        assert!(wizard.errors().get(DraftField::ReasonForVisit).is_none());
        assert!(wizard.errors().get(DraftField::AppointmentDate).is_some());
    }

    #[test]
    fn preferences_step_is_ungated_and_back_is_stepwise() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");

        assert_eq!(wizard.advance(early_monday()), Ok(WizardStep::Preferences));
        assert_eq!(wizard.advance(early_monday()), Ok(WizardStep::Review));
        assert_eq!(wizard.advance(early_monday()), Err(WizardError::AlreadyAtReview));

        // Going back never re-validates, even with a now-invalid draft.
        wizard.update(FieldUpdate::ReasonForVisit(String::new()), early_monday());
        assert_eq!(wizard.back(), WizardStep::Preferences);
        assert_eq!(wizard.back(), WizardStep::Details);
        assert_eq!(wizard.back(), WizardStep::Details);
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn refresh_drops_time_that_got_booked() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");

        let booked: Appointment = serde_json::from_value(serde_json::json!({
            "id": "apt-9",
            "appointmentDate": "2026-10-19",
            "appointmentTime": "09:30",
            "status": "pending"
        }))
        .unwrap();
        let rules = vec![AvailabilityRule::new("Monday", &["09:00-11:00"])];
        wizard.refresh_availability(
            SlotAvailability::new(rules, vec![booked], SlotGenerator::default()),
            early_monday(),
        );

        assert_eq!(wizard.draft().appointment_time, None);
        assert_eq!(wizard.available_slots().len(), 3);
    }

    #[test]
    fn ensure_submittable_flags_stale_draft() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "Routine checkup");
        wizard.advance(early_monday()).unwrap();
        wizard.advance(early_monday()).unwrap();

        let too_late = monday().and_time(at(10, 0));
        assert_matches!(wizard.ensure_submittable(too_late), Err(WizardError::ValidationFailed(_)));
        assert!(wizard.errors().get(DraftField::AppointmentTime).is_some());
        assert_eq!(wizard.step(), WizardStep::Review);
    }
}
