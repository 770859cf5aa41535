pub mod booking;
pub mod classifier;
pub mod directory;
pub mod submission;
pub mod wizard;

pub use booking::{BookingError, BookingFlow, FlowPhase, SubmitOutcome};
pub use classifier::{booked_times, classify, classify_status, consumes_slot, exclude_unavailable};
pub use directory::AppointmentDirectory;
pub use submission::{AppointmentSubmitter, RestAppointmentSubmitter};
pub use wizard::{
    validate_draft_details, BookingWizard, FieldUpdate, SlotAvailability, ValidationErrors,
    WizardError, WizardStep,
};
