//! Weekly opening hours and date overrides.

use chrono::NaiveDate;

use crate::domain::availability::{AvailabilityOverride, WeeklyHours};
use crate::domain::types::TenantId;
use crate::forms::availability::{
    OverrideListParams, OverridePayload, WeeklyHoursPayload, WeeklySchedulePayload,
};
use crate::forms::booking::parse_date;
use crate::repository::{AvailabilityReader, AvailabilityWriter};
use crate::schedule::{DayAvailability, resolve_day_hours};
use crate::services::{ServiceError, ServiceResult};

pub fn list_weekly_hours<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<WeeklyHours>>
where
    R: AvailabilityReader + ?Sized,
{
    Ok(repo.list_weekly_hours(tenant_id)?)
}

/// Creates or replaces the hours of a single weekday.
pub fn set_day_hours<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: WeeklyHoursPayload,
) -> ServiceResult<WeeklyHours>
where
    R: AvailabilityWriter + ?Sized,
{
    let hours = payload.into_domain()?;
    Ok(repo.upsert_weekly_hours(tenant_id, &hours)?)
}

/// Replaces the whole weekly schedule; omitted days become closed.
pub fn replace_weekly_hours<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: WeeklySchedulePayload,
) -> ServiceResult<Vec<WeeklyHours>>
where
    R: AvailabilityWriter + ?Sized,
{
    let hours = payload.into_domain()?;
    repo.replace_weekly_hours(tenant_id, &hours).map_err(|err| {
        log::error!("Failed to replace weekly hours of tenant {tenant_id}: {err}");
        err.into()
    })
}

pub fn list_overrides<R>(
    repo: &R,
    tenant_id: TenantId,
    params: OverrideListParams,
) -> ServiceResult<Vec<AvailabilityOverride>>
where
    R: AvailabilityReader + ?Sized,
{
    let from = params.from.as_deref().map(parse_date).transpose()?;
    Ok(repo.list_overrides(tenant_id, from)?)
}

/// Creates the override for a date, replacing an existing one.
pub fn set_override<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: OverridePayload,
) -> ServiceResult<AvailabilityOverride>
where
    R: AvailabilityWriter + ?Sized,
{
    let new_override = payload.into_domain(tenant_id)?;
    Ok(repo.upsert_override(&new_override)?)
}

pub fn delete_override<R>(repo: &R, tenant_id: TenantId, id: i32) -> ServiceResult<()>
where
    R: AvailabilityWriter + ?Sized,
{
    if id <= 0 {
        return Err(ServiceError::not_found("Override"));
    }
    Ok(repo.delete_override(id, tenant_id)?)
}

/// Opening state of a date after applying its override.
pub fn day_hours<R>(
    repo: &R,
    tenant_id: TenantId,
    date: NaiveDate,
) -> ServiceResult<DayAvailability>
where
    R: AvailabilityReader + ?Sized,
{
    let weekly = repo.list_weekly_hours(tenant_id)?;
    let date_override = repo.get_override_for_date(tenant_id, date)?;
    Ok(resolve_day_hours(date, &weekly, date_override.as_ref()))
}
