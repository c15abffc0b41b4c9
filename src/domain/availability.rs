//! Weekly opening hours, per-date overrides and the daily break window.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::types::{ClockTime, TenantId, TypeConstraintError, text_enum};

text_enum!(
    /// How a date override changes the regular weekly hours.
    OverrideKind {
        Closed => "closed",
        Custom => "custom",
    }
);

/// Opening hours for one weekday (0 = Sunday).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WeeklyHours {
    pub id: i32,
    pub tenant_id: TenantId,
    pub day_of_week: u32,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewWeeklyHours {
    pub day_of_week: u32,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub active: bool,
}

impl NewWeeklyHours {
    pub fn try_new(
        day_of_week: u32,
        start_time: ClockTime,
        end_time: ClockTime,
        active: bool,
    ) -> Result<Self, TypeConstraintError> {
        if day_of_week > 6 {
            return Err(TypeConstraintError::InvalidValue(
                "day_of_week must be between 0 and 6".to_string(),
            ));
        }
        if active && start_time >= end_time {
            return Err(TypeConstraintError::InvalidValue(
                "start time must be before end time".to_string(),
            ));
        }
        Ok(Self {
            day_of_week,
            start_time,
            end_time,
            active,
        })
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AvailabilityOverride {
    pub id: i32,
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub kind: OverrideKind,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewAvailabilityOverride {
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub kind: OverrideKind,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub reason: Option<String>,
}

impl NewAvailabilityOverride {
    /// Custom overrides need an ordered pair of times; closed ones drop them.
    pub fn try_new(
        tenant_id: TenantId,
        date: NaiveDate,
        kind: OverrideKind,
        start_time: Option<ClockTime>,
        end_time: Option<ClockTime>,
        reason: Option<String>,
    ) -> Result<Self, TypeConstraintError> {
        let (start_time, end_time) = match kind {
            OverrideKind::Closed => (None, None),
            OverrideKind::Custom => match (start_time, end_time) {
                (Some(start), Some(end)) if start < end => (Some(start), Some(end)),
                (Some(_), Some(_)) => {
                    return Err(TypeConstraintError::InvalidValue(
                        "start time must be before end time".to_string(),
                    ));
                }
                _ => {
                    return Err(TypeConstraintError::InvalidValue(
                        "custom hours require a start and end time".to_string(),
                    ));
                }
            },
        };
        Ok(Self {
            tenant_id,
            date,
            kind,
            start_time,
            end_time,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        })
    }
}

/// Daily break during which appointments pause.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct BreakWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl BreakWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, TypeConstraintError> {
        if start >= end {
            return Err(TypeConstraintError::InvalidValue(
                "break start must be before break end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }
}
