pub mod availability;
pub mod slots;
pub mod time_format;

pub use availability::AvailabilityService;
pub use slots::{generate_slots, SlotGenerator, DEFAULT_GRANULARITY_MINUTES};
pub use time_format::{format_12_hour, to_12_hour};
