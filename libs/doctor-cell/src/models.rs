use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::services::time_format::format_12_hour;

// ==============================================================================
// WEEKDAY VOCABULARY
// ==============================================================================

/// Weekday name as used in `AvailabilityRule::day`.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// 0 = Sunday, 1 = Monday, etc.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Parses 24-hour "HH:MM" (seconds tolerated for backend payloads).
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Weekly availability for one weekday, e.g. `{ "day": "Monday", "slots": ["09:00-12:00"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub day: String,
    #[serde(default)]
    pub slots: Vec<String>,
}

impl AvailabilityRule {
    pub fn new(day: impl Into<String>, slots: &[&str]) -> Self {
        Self {
            day: day.into(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Case-insensitive match against the English weekday name.
    pub fn applies_to(&self, weekday: Weekday) -> bool {
        self.day.trim().eq_ignore_ascii_case(weekday_name(weekday))
    }
}

/// A parsed `"HH:MM-HH:MM"` range. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn parse(raw: &str) -> Result<Self, DoctorError> {
        let (start, end) = raw
            .split_once('-')
            .ok_or_else(|| DoctorError::MalformedRange(raw.to_string()))?;

        let start = parse_clock(start).ok_or_else(|| DoctorError::MalformedRange(raw.to_string()))?;
        let end = parse_clock(end).ok_or_else(|| DoctorError::MalformedRange(raw.to_string()))?;

        if start >= end {
            return Err(DoctorError::EmptyRange(raw.to_string()));
        }

        Ok(Self { start, end })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// One bookable start time. Serialised as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookableSlot {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

impl BookableSlot {
    pub fn new(time: NaiveTime) -> Self {
        Self { time }
    }

    /// 12-hour display label, e.g. "9:30 AM".
    pub fn label(&self) -> String {
        format_12_hour(self.time)
    }
}

impl fmt::Display for BookableSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M"))
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsRequest {
    pub rules: Vec<AvailabilityRule>,
    pub date: NaiveDate,
    pub granularity_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub time: String,
    pub label: String,
}

impl From<&BookableSlot> for SlotView {
    fn from(slot: &BookableSlot) -> Self {
        Self {
            time: slot.to_string(),
            label: slot.label(),
        }
    }
}

/// Slots for one date, ready for display. An empty day carries guidance
/// instead of being an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotListing {
    pub date: NaiveDate,
    pub weekday: String,
    pub slots: Vec<SlotView>,
    pub total_slots: usize,
    pub message: Option<String>,
}

impl SlotListing {
    pub fn new(date: NaiveDate, slots: &[BookableSlot]) -> Self {
        let weekday = weekday_name(date.weekday()).to_string();
        let message = if slots.is_empty() {
            Some(format!(
                "No available time slots on {} ({}). Please choose another date.",
                weekday, date
            ))
        } else {
            None
        };

        Self {
            date,
            weekday,
            slots: slots.iter().map(SlotView::from).collect(),
            total_slots: slots.len(),
            message,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DoctorError {
    #[error("Malformed availability range: '{0}'")]
    MalformedRange(String),

    #[error("Availability range must start before it ends: '{0}'")]
    EmptyRange(String),

    #[error("Slot granularity must be between 1 and 1440 minutes, got {0}")]
    InvalidGranularity(u32),

    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Availability lookup failed: {0}")]
    Backend(String),
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

/// `NaiveTime` <-> `"HH:MM"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::parse_clock;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_clock(&raw).ok_or_else(|| de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }

    /// Optional variant; empty strings read as `None`.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        use super::super::parse_clock;

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.collect_str(&time.format("%H:%M")),
                None => serializer.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => parse_clock(value)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid time '{}', expected HH:MM", value))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_range() {
        let range = TimeRange::parse("09:00-11:30").unwrap();
        assert_eq!(range.start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(range.end, NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert!(range.contains(NaiveTime::from_hms_opt(11, 0, 0).unwrap()));
        assert!(!range.contains(range.end));
    }

    #[test]
    fn rejects_bad_ranges() {
        assert_matches!(TimeRange::parse("0900"), Err(DoctorError::MalformedRange(_)));
        assert_matches!(TimeRange::parse("ab:cd-10:00"), Err(DoctorError::MalformedRange(_)));
        assert_matches!(TimeRange::parse("09:00-25:00"), Err(DoctorError::MalformedRange(_)));
        assert_matches!(TimeRange::parse("10:00-09:00"), Err(DoctorError::EmptyRange(_)));
        assert_matches!(TimeRange::parse("10:00-10:00"), Err(DoctorError::EmptyRange(_)));
    }

    #[test]
    fn rule_day_matches_case_insensitively() {
        let rule = AvailabilityRule::new("  monDAY ", &["09:00-10:00"]);
        assert!(rule.applies_to(Weekday::Mon));
        assert!(!rule.applies_to(Weekday::Tue));
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(weekday_index(sunday), 0);
        assert_eq!(weekday_index(sunday.succ_opt().unwrap()), 1);
    }

    #[test]
    fn slot_serialises_as_hhmm() {
        let slot = BookableSlot::new(NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(serde_json::to_value(slot).unwrap(), serde_json::json!({ "time": "09:05" }));
        let back: BookableSlot = serde_json::from_str(r#"{"time":"09:05"}"#).unwrap();
        assert_eq!(back, slot);
    }

    #[test]
    fn empty_listing_has_guidance() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let listing = SlotListing::new(date, &[]);
        assert_eq!(listing.weekday, "Sunday");
        assert_eq!(listing.total_slots, 0);
        assert!(listing.message.unwrap().contains("choose another date"));
    }
}
