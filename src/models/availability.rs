use chrono::NaiveDate;
use diesel::prelude::*;

use crate::domain::availability::{
    AvailabilityOverride as DomainOverride, NewAvailabilityOverride as DomainNewOverride,
    NewWeeklyHours, WeeklyHours as DomainWeeklyHours,
};
use crate::domain::types::{ClockTime, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::availability)]
/// Diesel model for [`crate::domain::availability::WeeklyHours`].
pub struct WeeklyHours {
    pub id: i32,
    pub tenant_id: i32,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::availability)]
pub struct NewWeeklyHoursRow {
    pub tenant_id: i32,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::availability_overrides)]
/// Diesel model for [`crate::domain::availability::AvailabilityOverride`].
pub struct AvailabilityOverride {
    pub id: i32,
    pub tenant_id: i32,
    pub date: NaiveDate,
    pub kind: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::availability_overrides)]
#[diesel(treat_none_as_null = true)]
pub struct NewAvailabilityOverride<'a> {
    pub tenant_id: i32,
    pub date: NaiveDate,
    pub kind: &'a str,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<&'a str>,
}

impl TryFrom<WeeklyHours> for DomainWeeklyHours {
    type Error = TypeConstraintError;

    fn try_from(hours: WeeklyHours) -> Result<Self, Self::Error> {
        Ok(Self {
            id: hours.id,
            tenant_id: TenantId::try_from(hours.tenant_id)?,
            day_of_week: u32::try_from(hours.day_of_week).map_err(|_| {
                TypeConstraintError::InvalidValue("day_of_week must be between 0 and 6".into())
            })?,
            start_time: ClockTime::parse(&hours.start_time)?,
            end_time: ClockTime::parse(&hours.end_time)?,
            active: hours.active,
        })
    }
}

impl NewWeeklyHoursRow {
    pub fn new(tenant_id: TenantId, hours: &NewWeeklyHours) -> Self {
        Self {
            tenant_id: tenant_id.get(),
            // Checked to be at most 6 on construction.
            day_of_week: hours.day_of_week as i32,
            start_time: hours.start_time.to_string(),
            end_time: hours.end_time.to_string(),
            active: hours.active,
        }
    }
}

impl TryFrom<AvailabilityOverride> for DomainOverride {
    type Error = TypeConstraintError;

    fn try_from(row: AvailabilityOverride) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            tenant_id: TenantId::try_from(row.tenant_id)?,
            date: row.date,
            kind: row.kind.parse()?,
            start_time: row.start_time.as_deref().map(ClockTime::parse).transpose()?,
            end_time: row.end_time.as_deref().map(ClockTime::parse).transpose()?,
            reason: row.reason,
        })
    }
}

impl<'a> From<&'a DomainNewOverride> for NewAvailabilityOverride<'a> {
    fn from(value: &'a DomainNewOverride) -> Self {
        Self {
            tenant_id: value.tenant_id.get(),
            date: value.date,
            kind: value.kind.as_str(),
            start_time: value.start_time.map(String::from),
            end_time: value.end_time.map(String::from),
            reason: value.reason.as_deref(),
        }
    }
}
