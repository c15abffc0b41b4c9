//! Break-aware scheduling over already-loaded availability and bookings.
//!
//! All values are tenant-local wall-clock times. Intervals are half-open:
//! a booking ending at 10:00 does not collide with one starting at 10:00.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::domain::availability::{AvailabilityOverride, BreakWindow, OverrideKind, WeeklyHours};
use crate::domain::booking::Booking;
use crate::domain::types::ClockTime;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("slot interval must be positive")]
    InvalidInterval,
    #[error("duration must be positive")]
    InvalidDuration,
}

/// Opening state of a single calendar date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayAvailability {
    Open { open: ClockTime, close: ClockTime },
    Closed { reason: String },
}

impl DayAvailability {
    fn closed(reason: impl Into<String>) -> Self {
        DayAvailability::Closed {
            reason: reason.into(),
        }
    }
}

/// Interval occupied by an existing booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BookedSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn minutes(value: i64) -> Duration {
    Duration::minutes(value)
}

/// Length of the break in minutes, 0 when no break is configured.
pub fn break_duration_minutes(window: Option<BreakWindow>) -> i64 {
    window
        .map(|w| w.end.minutes_from_midnight() - w.start.minutes_from_midnight())
        .unwrap_or(0)
}

/// Whether `[slot_start, slot_end)` intersects the break on `slot_start`'s day.
pub fn slot_overlaps_break(
    slot_start: NaiveDateTime,
    slot_end: NaiveDateTime,
    window: Option<BreakWindow>,
) -> bool {
    let Some(window) = window else {
        return false;
    };
    let day = slot_start.date();
    let break_start = day.and_time(window.start.as_naive());
    let break_end = day.and_time(window.end.as_naive());
    slot_start < break_end && slot_end > break_start
}

/// End time of an appointment, pushed back by the break length when the
/// appointment would run through the break.
pub fn calculate_adjusted_end_time(
    start: NaiveDateTime,
    duration_minutes: i32,
    window: Option<BreakWindow>,
) -> NaiveDateTime {
    let naive_end = start + minutes(i64::from(duration_minutes));
    if slot_overlaps_break(start, naive_end, window) {
        naive_end + minutes(break_duration_minutes(window))
    } else {
        naive_end
    }
}

/// Resolves the hours for `date`: an override wins over the weekly entry for
/// that weekday (0 = Sunday).
pub fn resolve_day_hours(
    date: NaiveDate,
    weekly: &[WeeklyHours],
    date_override: Option<&AvailabilityOverride>,
) -> DayAvailability {
    if let Some(entry) = date_override {
        match (entry.kind, entry.start_time, entry.end_time) {
            (OverrideKind::Custom, Some(open), Some(close)) => {
                return DayAvailability::Open { open, close };
            }
            _ => {
                return DayAvailability::closed(
                    entry.reason.clone().unwrap_or_else(|| "Closed".to_string()),
                );
            }
        }
    }

    let weekday = date.weekday().num_days_from_sunday();
    weekly
        .iter()
        .find(|entry| entry.day_of_week == weekday && entry.active)
        .map(|entry| DayAvailability::Open {
            open: entry.start_time,
            close: entry.end_time,
        })
        .unwrap_or_else(|| DayAvailability::closed("Not available on this day"))
}

fn occupied_span(booking: &Booking, window: Option<BreakWindow>) -> BookedSlot {
    BookedSlot {
        start: booking.scheduled_at,
        end: calculate_adjusted_end_time(booking.scheduled_at, booking.duration_minutes, window),
    }
}

/// Occupied intervals of the active bookings, extended across the break.
pub fn booked_slots(bookings: &[Booking], window: Option<BreakWindow>) -> Vec<BookedSlot> {
    bookings
        .iter()
        .filter(|b| b.status.is_active())
        .map(|b| occupied_span(b, window))
        .collect()
}

/// First active booking whose break-adjusted span overlaps the candidate's.
pub fn find_conflict<'a>(
    candidate_start: NaiveDateTime,
    duration_minutes: i32,
    window: Option<BreakWindow>,
    existing: &'a [Booking],
) -> Option<&'a Booking> {
    let candidate_end = calculate_adjusted_end_time(candidate_start, duration_minutes, window);
    existing.iter().find(|b| {
        if !b.status.is_active() {
            return false;
        }
        let span = occupied_span(b, window);
        span.start < candidate_end && span.end > candidate_start
    })
}

/// Start times on `date` at which an appointment of `duration_minutes` fits.
pub fn available_slots(
    date: NaiveDate,
    hours: &DayAvailability,
    slot_interval: i32,
    duration_minutes: i32,
    window: Option<BreakWindow>,
    bookings: &[Booking],
) -> Result<Vec<NaiveDateTime>, ScheduleError> {
    if slot_interval <= 0 {
        return Err(ScheduleError::InvalidInterval);
    }
    if duration_minutes <= 0 {
        return Err(ScheduleError::InvalidDuration);
    }
    let DayAvailability::Open { open, close } = hours else {
        return Ok(Vec::new());
    };

    let close_at = date.and_time(close.as_naive());
    let taken = booked_slots(bookings, window);
    let mut slots = Vec::new();
    let mut start = date.and_time(open.as_naive());

    while start < close_at {
        let end = calculate_adjusted_end_time(start, duration_minutes, window);
        let starts_in_break = window.is_some_and(|w| {
            let t = start.time();
            t >= w.start.as_naive() && t < w.end.as_naive()
        });
        let overlaps_booking = taken.iter().any(|s| s.start < end && s.end > start);

        if end <= close_at && !starts_in_break && !overlaps_booking {
            slots.push(start);
        }
        start += minutes(i64::from(slot_interval));
    }

    Ok(slots)
}
