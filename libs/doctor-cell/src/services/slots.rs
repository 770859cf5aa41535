use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

use shared_config::BookingSettings;

use crate::models::{AvailabilityRule, BookableSlot, DoctorError, TimeRange};

pub const DEFAULT_GRANULARITY_MINUTES: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Turns weekly availability rules into the bookable start times of one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGenerator {
    granularity_minutes: u32,
}

impl Default for SlotGenerator {
    fn default() -> Self {
        Self {
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }
}

impl SlotGenerator {
    pub fn new(granularity_minutes: u32) -> Result<Self, DoctorError> {
        if granularity_minutes == 0 || granularity_minutes > MINUTES_PER_DAY {
            return Err(DoctorError::InvalidGranularity(granularity_minutes));
        }
        Ok(Self { granularity_minutes })
    }

    /// Falls back to the default granularity when the configured one is unusable.
    pub fn from_settings(settings: &BookingSettings) -> Self {
        Self::new(settings.slot_granularity_minutes).unwrap_or_else(|e| {
            warn!("{}; falling back to {} minutes", e, DEFAULT_GRANULARITY_MINUTES);
            Self::default()
        })
    }

    pub fn granularity_minutes(&self) -> u32 {
        self.granularity_minutes
    }

    /// Slots for `date`, in range declaration order then chronological order
    /// within each range. Ranges are neither merged nor de-duplicated.
    ///
    /// A date whose weekday has no rule yields an empty list. Malformed ranges
    /// are skipped with a warning; the remaining ranges still produce slots.
    pub fn generate(&self, rules: &[AvailabilityRule], date: NaiveDate) -> Vec<BookableSlot> {
        let weekday = date.weekday();

        let Some(rule) = rules.iter().find(|rule| rule.applies_to(weekday)) else {
            debug!("No availability rule for {} ({:?})", date, weekday);
            return Vec::new();
        };

        let mut slots = Vec::new();
        for raw in &rule.slots {
            match TimeRange::parse(raw) {
                Ok(range) => slots.extend(self.slots_in_range(&range)),
                Err(e) => warn!("Skipping availability range for {}: {}", rule.day, e),
            }
        }

        debug!("Generated {} slots for {}", slots.len(), date);
        slots
    }

    /// `start, start + g, ...` strictly before `end`. Never wraps past midnight.
    pub fn slots_in_range(&self, range: &TimeRange) -> Vec<BookableSlot> {
        let step = Duration::minutes(self.granularity_minutes as i64);
        let mut slots = Vec::new();
        let mut current = range.start;

        while current < range.end {
            slots.push(BookableSlot::new(current));

            let (next, wrapped_secs) = current.overflowing_add_signed(step);
            if wrapped_secs != 0 {
                break;
            }
            current = next;
        }

        slots
    }
}

/// Free-function form of `SlotGenerator::generate`.
pub fn generate_slots(
    rules: &[AvailabilityRule],
    date: NaiveDate,
    granularity_minutes: u32,
) -> Result<Vec<BookableSlot>, DoctorError> {
    Ok(SlotGenerator::new(granularity_minutes)?.generate(rules, date))
}
