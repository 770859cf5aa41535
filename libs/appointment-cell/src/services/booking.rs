// libs/appointment-cell/src/services/booking.rs
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use shared_config::BookingSettings;

use crate::models::{BookingDraft, BookingRequest, Notification};
use crate::services::submission::AppointmentSubmitter;
use crate::services::wizard::{
    BookingWizard, FieldUpdate, SlotAvailability, ValidationErrors, WizardError, WizardStep,
};

const BOOKED_MESSAGE: &str = "Appointment booked successfully";
const FAILED_MESSAGE: &str = "Failed to book appointment. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Closed,
    Editing,
    Submitting,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("No booking is open")]
    NotOpen,

    #[error("Booking can only be submitted from the review step, currently at {0}")]
    NotAtReview(WizardStep),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error(transparent)]
    Wizard(#[from] WizardError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Booked {
        appointment_id: Option<String>,
        notification: Notification,
    },
    /// The wizard is still open at review; the user may try again.
    Failed(Notification),
    /// The flow was closed or reopened while the request was in flight.
    Discarded,
}

struct FlowState {
    generation: u64,
    phase: FlowPhase,
    doctor_id: String,
    wizard: Option<BookingWizard>,
}

/// Owns one booking wizard at a time plus its submission.
///
/// Closing bumps a generation counter; a submission that completes under an
/// older generation is dropped without touching the current state.
pub struct BookingFlow {
    submitter: Arc<dyn AppointmentSubmitter>,
    settings: BookingSettings,
    state: Mutex<FlowState>,
}

impl BookingFlow {
    pub fn new(submitter: Arc<dyn AppointmentSubmitter>, settings: BookingSettings) -> Self {
        Self {
            submitter,
            settings,
            state: Mutex::new(FlowState {
                generation: 0,
                phase: FlowPhase::Closed,
                doctor_id: String::new(),
                wizard: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fresh booking for `doctor_id`, discarding any open one.
    pub fn open(&self, doctor_id: impl Into<String>, availability: SlotAvailability) {
        let mut state = self.lock();
        state.generation += 1;
        state.doctor_id = doctor_id.into();
        state.wizard = Some(
            BookingWizard::open(availability).with_min_reason_length(self.settings.min_reason_length),
        );
        state.phase = FlowPhase::Editing;
        debug!("Opened booking for doctor {} (generation {})", state.doctor_id, state.generation);
    }

    pub fn close(&self) {
        let mut state = self.lock();
        Self::close_locked(&mut state);
    }

    fn close_locked(state: &mut FlowState) {
        state.generation += 1;
        state.wizard = None;
        state.phase = FlowPhase::Closed;
        debug!("Closed booking (generation {})", state.generation);
    }

    pub fn phase(&self) -> FlowPhase {
        self.lock().phase
    }

    pub fn step(&self) -> Option<WizardStep> {
        self.lock().wizard.as_ref().map(BookingWizard::step)
    }

    pub fn draft(&self) -> Option<BookingDraft> {
        self.lock().wizard.as_ref().map(|w| w.draft().clone())
    }

    pub fn errors(&self) -> Option<ValidationErrors> {
        self.lock().wizard.as_ref().map(|w| w.errors().clone())
    }

    fn editing<R>(
        &self,
        f: impl FnOnce(&mut BookingWizard) -> Result<R, BookingError>,
    ) -> Result<R, BookingError> {
        let mut state = self.lock();
        match state.phase {
            FlowPhase::Editing => {}
            FlowPhase::Submitting => return Err(BookingError::SubmissionInFlight),
            FlowPhase::Closed | FlowPhase::Succeeded => return Err(BookingError::NotOpen),
        }
        let wizard = state.wizard.as_mut().ok_or(BookingError::NotOpen)?;
        f(wizard)
    }

    pub fn update(&self, update: FieldUpdate, now: NaiveDateTime) -> Result<(), BookingError> {
        self.editing(|wizard| {
            wizard.update(update, now);
            Ok(())
        })
    }

    pub fn refresh_availability(
        &self,
        availability: SlotAvailability,
        now: NaiveDateTime,
    ) -> Result<(), BookingError> {
        self.editing(|wizard| {
            wizard.refresh_availability(availability, now);
            Ok(())
        })
    }

    pub fn advance(&self, now: NaiveDateTime) -> Result<WizardStep, BookingError> {
        self.editing(|wizard| Ok(wizard.advance(now)?))
    }

    pub fn back(&self) -> Result<WizardStep, BookingError> {
        self.editing(|wizard| Ok(wizard.back()))
    }

    /// Submit the reviewed draft.
    ///
    /// The state lock is released for the duration of the backend call. On
    /// success the confirmation stays visible for `success_display_delay`
    /// before the flow closes itself.
    pub async fn submit(&self, now: NaiveDateTime) -> Result<SubmitOutcome, BookingError> {
        let (generation, request) = {
            let mut state = self.lock();
            match state.phase {
                FlowPhase::Editing => {}
                FlowPhase::Submitting => return Err(BookingError::SubmissionInFlight),
                FlowPhase::Closed | FlowPhase::Succeeded => return Err(BookingError::NotOpen),
            }

            let doctor_id = state.doctor_id.clone();
            let wizard = state.wizard.as_mut().ok_or(BookingError::NotOpen)?;
            if wizard.step() != WizardStep::Review {
                return Err(BookingError::NotAtReview(wizard.step()));
            }
            wizard.ensure_submittable(now)?;

            let request = BookingRequest::new(doctor_id, wizard.draft().clone());
            state.phase = FlowPhase::Submitting;
            (state.generation, request)
        };
        let _settle = SubmitSettle { flow: self, generation };

        info!("Submitting booking {} for doctor {}", request.submission_id, request.doctor_id);
        let result = self.submitter.submit(&request).await;

        let outcome = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Booking {} finished after the flow was closed; ignoring", request.submission_id);
                return Ok(SubmitOutcome::Discarded);
            }

            match result {
                Ok(response) if response.success => {
                    state.phase = FlowPhase::Succeeded;
                    SubmitOutcome::Booked {
                        appointment_id: response.appointment_id,
                        notification: Notification::success(
                            response.message.unwrap_or_else(|| BOOKED_MESSAGE.to_string()),
                            self.settings.notification_ttl,
                        ),
                    }
                }
                Ok(response) => {
                    state.phase = FlowPhase::Editing;
                    let message = response.message.unwrap_or_else(|| FAILED_MESSAGE.to_string());
                    return Ok(SubmitOutcome::Failed(Notification::error(
                        message,
                        self.settings.notification_ttl,
                    )));
                }
                Err(e) => {
                    warn!("Booking {} failed: {}", request.submission_id, e);
                    state.phase = FlowPhase::Editing;
                    return Ok(SubmitOutcome::Failed(Notification::error(
                        FAILED_MESSAGE,
                        self.settings.notification_ttl,
                    )));
                }
            }
        };

        tokio::time::sleep(self.settings.success_display_delay).await;

        let mut state = self.lock();
        if state.generation == generation {
            Self::close_locked(&mut state);
        }

        Ok(outcome)
    }
}

/// Settles a submission whose future was dropped mid-flight: a pending request
/// reopens the wizard at review, a shown confirmation closes the flow.
struct SubmitSettle<'a> {
    flow: &'a BookingFlow,
    generation: u64,
}

impl Drop for SubmitSettle<'_> {
    fn drop(&mut self) {
        let mut state = self.flow.lock();
        if state.generation != self.generation {
            return;
        }
        match state.phase {
            FlowPhase::Submitting => {
                debug!("Submission abandoned; booking back to editing");
                state.phase = FlowPhase::Editing;
            }
            FlowPhase::Succeeded => BookingFlow::close_locked(&mut state),
            FlowPhase::Editing | FlowPhase::Closed => {}
        }
    }
}
