use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::domain::availability::BreakWindow;
use crate::domain::types::{ClockTime, TenantId, TenantName, TenantSlug, TypeConstraintError};

/// Parses an IANA zone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> Result<Tz, TypeConstraintError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TypeConstraintError::InvalidValue(format!("unknown timezone `{name}`")))
}

/// Business account owning every other record.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Tenant {
    pub id: TenantId,
    #[serde(skip_serializing)]
    pub org_id: Option<String>,
    pub slug: TenantSlug,
    pub name: TenantName,
    pub email: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub business_website: Option<String>,
    pub timezone: String,
    pub slot_interval: i32,
    pub break_start: Option<ClockTime>,
    pub break_end: Option<ClockTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Tenant {
    /// Daily break, present only when both ends are configured.
    pub fn break_window(&self) -> Option<BreakWindow> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => BreakWindow::new(start, end).ok(),
            _ => None,
        }
    }

    /// Zone the tenant's calendar is kept in. Unknown names fall back to UTC.
    pub fn tz(&self) -> Tz {
        parse_timezone(&self.timezone).unwrap_or(Tz::UTC)
    }

    /// Wall-clock time of the tenant at `instant`.
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz()).naive_local()
    }

    /// Current wall-clock time of the tenant.
    pub fn local_now(&self) -> NaiveDateTime {
        self.local_time(Utc::now())
    }

    /// UTC instant of a tenant wall-clock time. Times skipped by a DST jump
    /// are moved forward by an hour.
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        let tz = self.tz();
        tz.from_local_datetime(&local)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
            .map(|dt| dt.naive_utc())
            .unwrap_or(local)
    }
}

#[derive(Clone, Debug)]
pub struct NewTenant {
    pub org_id: Option<String>,
    pub slug: TenantSlug,
    pub name: TenantName,
    pub email: String,
    pub timezone: String,
}

/// Full replacement of the editable tenant settings.
#[derive(Clone, Debug)]
pub struct UpdateTenant {
    pub slug: TenantSlug,
    pub name: TenantName,
    pub email: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub business_website: Option<String>,
    pub timezone: String,
    pub slot_interval: i32,
    pub break_start: Option<ClockTime>,
    pub break_end: Option<ClockTime>,
}

impl From<&Tenant> for UpdateTenant {
    fn from(tenant: &Tenant) -> Self {
        Self {
            slug: tenant.slug.clone(),
            name: tenant.name.clone(),
            email: tenant.email.clone(),
            business_phone: tenant.business_phone.clone(),
            business_address: tenant.business_address.clone(),
            business_website: tenant.business_website.clone(),
            timezone: tenant.timezone.clone(),
            slot_interval: tenant.slot_interval,
            break_start: tenant.break_start,
            break_end: tenant.break_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn tenant(timezone: &str) -> Tenant {
        let created = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Tenant {
            id: TenantId::new(1).unwrap(),
            org_id: None,
            slug: TenantSlug::new("glow-studio").unwrap(),
            name: TenantName::new("Glow Studio").unwrap(),
            email: "owner@glow.test".to_string(),
            business_phone: None,
            business_address: None,
            business_website: None,
            timezone: timezone.to_string(),
            slot_interval: 30,
            break_start: None,
            break_end: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn local_time_follows_the_tenant_zone() {
        let tenant = tenant("America/New_York");
        let local = tenant.local_time(utc(2026, 1, 5, 15, 0));
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2026-01-05 10:00");
        let summer = tenant.local_time(utc(2026, 7, 6, 15, 0));
        assert_eq!(summer.format("%H:%M").to_string(), "11:00");
        assert_eq!(tenant.to_utc(local), utc(2026, 1, 5, 15, 0).naive_utc());
    }

    #[test]
    fn skipped_local_time_resolves_after_the_gap() {
        let tenant = tenant("America/New_York");
        let gap = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(tenant.to_utc(gap), utc(2026, 3, 8, 7, 30).naive_utc());
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
        assert_eq!(parse_timezone(" Europe/Berlin ").unwrap(), Tz::Europe__Berlin);
        let tenant = tenant("Mars/Olympus_Mons");
        assert_eq!(
            tenant.local_time(utc(2026, 1, 5, 15, 0)),
            utc(2026, 1, 5, 15, 0).naive_utc()
        );
    }
}
