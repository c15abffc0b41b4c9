use serde::Deserialize;

use crate::domain::availability::{NewAvailabilityOverride, NewWeeklyHours, OverrideKind};
use crate::domain::types::{ClockTime, TenantId};
use crate::forms::FormError;
use crate::forms::booking::parse_date;

/// One weekday's opening hours; `day_of_week` 0 is Sunday.
#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyHoursPayload {
    pub day_of_week: u32,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl WeeklyHoursPayload {
    pub fn into_domain(self) -> Result<NewWeeklyHours, FormError> {
        Ok(NewWeeklyHours::try_new(
            self.day_of_week,
            self.start_time,
            self.end_time,
            self.active,
        )?)
    }
}

/// Full weekly schedule replacing every stored row.
#[derive(Debug, Deserialize)]
pub struct WeeklySchedulePayload {
    pub hours: Vec<WeeklyHoursPayload>,
}

impl WeeklySchedulePayload {
    pub fn into_domain(self) -> Result<Vec<NewWeeklyHours>, FormError> {
        let mut seen = [false; 7];
        let mut hours = Vec::with_capacity(self.hours.len());
        for entry in self.hours {
            let entry = entry.into_domain()?;
            let day = entry.day_of_week as usize;
            if seen[day] {
                return Err(FormError::Invalid(format!(
                    "day_of_week {day} is listed more than once"
                )));
            }
            seen[day] = true;
            hours.push(entry);
        }
        Ok(hours)
    }
}

#[derive(Debug, Deserialize)]
pub struct OverridePayload {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: OverrideKind,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub reason: Option<String>,
}

impl OverridePayload {
    pub fn into_domain(self, tenant_id: TenantId) -> Result<NewAvailabilityOverride, FormError> {
        Ok(NewAvailabilityOverride::try_new(
            tenant_id,
            parse_date(&self.date)?,
            self.kind,
            self.start_time,
            self.end_time,
            self.reason.map(|r| ammonia::clean(&r)),
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OverrideListParams {
    pub from: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schedule_rejects_duplicate_days() {
        let payload: WeeklySchedulePayload = serde_json::from_value(json!({
            "hours": [
                {"day_of_week": 1, "start_time": "09:00", "end_time": "17:00"},
                {"day_of_week": 1, "start_time": "10:00", "end_time": "12:00"}
            ]
        }))
        .unwrap();
        assert!(matches!(payload.into_domain(), Err(FormError::Invalid(_))));
    }

    #[test]
    fn schedule_defaults_to_active_days() {
        let payload: WeeklySchedulePayload = serde_json::from_value(json!({
            "hours": [{"day_of_week": 0, "start_time": "9:00", "end_time": "13:00"}]
        }))
        .unwrap();
        let hours = payload.into_domain().unwrap();
        assert!(hours[0].active);
        assert_eq!(hours[0].start_time.to_string(), "09:00");
    }

    #[test]
    fn override_parses_date_and_kind() {
        let payload: OverridePayload = serde_json::from_value(json!({
            "date": "2026-12-25",
            "type": "closed",
            "reason": "Holiday"
        }))
        .unwrap();
        let new_override = payload.into_domain(TenantId::new(1).unwrap()).unwrap();
        assert_eq!(new_override.kind, OverrideKind::Closed);
        assert_eq!(new_override.reason.as_deref(), Some("Holiday"));

        let bad: OverridePayload = serde_json::from_value(json!({
            "date": "25/12/2026",
            "type": "closed"
        }))
        .unwrap();
        assert!(bad.into_domain(TenantId::new(1).unwrap()).is_err());
    }
}
