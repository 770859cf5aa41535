// libs/appointment-cell/src/services/classifier.rs
use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use doctor_cell::models::BookableSlot;

use crate::models::{
    Appointment, AppointmentClassification, AppointmentStatus, BadgeColor, StatusDisplay,
};

/// Badge and label for a status/type pair.
///
/// Urgent or emergency appointment types are highlighted even when the status
/// itself is ordinary, unless the appointment is already over or cancelled.
pub fn classify_status(status: &AppointmentStatus, appointment_type: &str) -> StatusDisplay {
    let base = match status {
        AppointmentStatus::Scheduled => BadgeColor::Blue,
        AppointmentStatus::Confirmed => BadgeColor::Green,
        AppointmentStatus::Pending => BadgeColor::Yellow,
        AppointmentStatus::Completed => BadgeColor::Gray,
        AppointmentStatus::Cancelled => BadgeColor::Red,
        AppointmentStatus::Urgent => BadgeColor::Orange,
        AppointmentStatus::Unknown(_) => BadgeColor::Gray,
    };

    let is_final = matches!(status, AppointmentStatus::Completed | AppointmentStatus::Cancelled);
    let badge_color = if !is_final && is_urgent_type(appointment_type) {
        BadgeColor::Orange
    } else {
        base
    };

    StatusDisplay {
        badge_color,
        label: status.label().to_string(),
    }
}

fn is_urgent_type(appointment_type: &str) -> bool {
    let lowered = appointment_type.to_lowercase();
    lowered.contains("urgent") || lowered.contains("emergency")
}

/// Full display classification relative to `now` (local wall-clock time).
pub fn classify(appointment: &Appointment, now: NaiveDateTime) -> AppointmentClassification {
    let display = classify_status(&appointment.status, &appointment.appointment_type);

    AppointmentClassification {
        badge_color: display.badge_color,
        label: display.label,
        is_past: appointment.status == AppointmentStatus::Completed
            || appointment.scheduled_at() < now,
        is_cancelled: appointment.status == AppointmentStatus::Cancelled,
    }
}

/// Statuses that hold on to their time slot.
pub fn consumes_slot(status: &AppointmentStatus) -> bool {
    matches!(
        status,
        AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::Pending
    )
}

/// Times on `date` already held by slot-consuming appointments.
pub fn booked_times(appointments: &[Appointment], date: NaiveDate) -> BTreeSet<NaiveTime> {
    appointments
        .iter()
        .filter(|apt| apt.appointment_date == date && consumes_slot(&apt.status))
        .map(|apt| apt.appointment_time)
        .collect()
}

/// Generated slots minus times already booked on `date`, minus times that
/// have already passed when `date` is today. Order is preserved.
pub fn exclude_unavailable(
    slots: Vec<BookableSlot>,
    date: NaiveDate,
    now: NaiveDateTime,
    appointments: &[Appointment],
) -> Vec<BookableSlot> {
    let taken = booked_times(appointments, date);
    let total = slots.len();

    let available: Vec<BookableSlot> = slots
        .into_iter()
        .filter(|slot| !taken.contains(&slot.time))
        .filter(|slot| date.and_time(slot.time) > now)
        .collect();

    debug!(
        "{} of {} slots on {} remain after excluding {} booked times",
        available.len(),
        total,
        date,
        taken.len()
    );

    available
}
