use serde::Deserialize;
use validator::Validate;

use crate::domain::availability::BreakWindow;
use crate::domain::tenant::{NewTenant, Tenant, UpdateTenant, parse_timezone};
use crate::domain::types::{ClockTime, ContactEmail, TenantName, TenantSlug};
use crate::forms::{FormError, trimmed};

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Provisioning request for the caller's organization.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub email: Option<String>,
    pub slug: Option<String>,
    pub timezone: Option<String>,
}

impl CreateTenantPayload {
    pub fn into_domain(
        self,
        org_id: &str,
        fallback_email: &str,
    ) -> Result<NewTenant, FormError> {
        self.validate()?;
        let slug = match trimmed(self.slug) {
            Some(slug) => TenantSlug::new(slug)?,
            None => TenantSlug::from_name(&self.name)?,
        };
        Ok(NewTenant {
            org_id: Some(org_id.to_string()),
            slug,
            name: TenantName::new(self.name)?,
            email: business_email(
                trimmed(self.email).unwrap_or_else(|| fallback_email.to_string()),
            )?,
            timezone: timezone_name(
                trimmed(self.timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            )?,
        })
    }
}

/// Partial settings update; absent fields keep their current value.
///
/// `break_start`/`break_end` accept an empty string to clear the break.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub email: Option<String>,
    pub slug: Option<String>,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    #[validate(url)]
    pub business_website: Option<String>,
    pub timezone: Option<String>,
    #[validate(range(min = 5, max = 120))]
    pub slot_interval: Option<i32>,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
}

fn business_email(value: String) -> Result<String, FormError> {
    Ok(ContactEmail::new(value)?.into_inner())
}

/// Canonical IANA name of a submitted zone.
fn timezone_name(value: String) -> Result<String, FormError> {
    Ok(parse_timezone(&value)?.name().to_string())
}

fn clock_or_clear(
    value: Option<String>,
    current: Option<ClockTime>,
) -> Result<Option<ClockTime>, FormError> {
    match value {
        None => Ok(current),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => Ok(Some(ClockTime::parse(&v)?)),
    }
}

impl UpdateTenantPayload {
    /// Merges the payload into the current settings.
    pub fn apply(self, current: &Tenant) -> Result<UpdateTenant, FormError> {
        self.validate()?;
        let mut updates = UpdateTenant::from(current);

        if let Some(name) = self.name {
            updates.name = TenantName::new(name)?;
        }
        if let Some(email) = trimmed(self.email) {
            updates.email = business_email(email)?;
        }
        if let Some(slug) = self.slug {
            updates.slug = TenantSlug::new(slug)?;
        }
        if let Some(phone) = self.business_phone {
            updates.business_phone = trimmed(Some(phone));
        }
        if let Some(address) = self.business_address {
            updates.business_address = trimmed(Some(address));
        }
        if let Some(website) = self.business_website {
            updates.business_website = trimmed(Some(website));
        }
        if let Some(timezone) = trimmed(self.timezone) {
            updates.timezone = timezone_name(timezone)?;
        }
        if let Some(interval) = self.slot_interval {
            updates.slot_interval = interval;
        }

        updates.break_start = clock_or_clear(self.break_start, updates.break_start)?;
        updates.break_end = clock_or_clear(self.break_end, updates.break_end)?;
        match (updates.break_start, updates.break_end) {
            (Some(start), Some(end)) => {
                BreakWindow::new(start, end)?;
            }
            (None, None) => {}
            _ => {
                return Err(FormError::Invalid(
                    "break start and end must be set together".to_string(),
                ));
            }
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TenantId;

    fn tenant() -> Tenant {
        let now = chrono::Utc::now().naive_utc();
        Tenant {
            id: TenantId::new(1).unwrap(),
            org_id: Some("org_1".to_string()),
            slug: TenantSlug::new("bright-smile").unwrap(),
            name: TenantName::new("Bright Smile").unwrap(),
            email: "hello@example.com".to_string(),
            business_phone: None,
            business_address: None,
            business_website: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            slot_interval: 30,
            break_start: None,
            break_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let payload = UpdateTenantPayload {
            slot_interval: Some(15),
            break_start: Some("12:00".to_string()),
            break_end: Some("13:00".to_string()),
            ..UpdateTenantPayload::default()
        };
        let updates = payload.apply(&tenant()).unwrap();
        assert_eq!(updates.slot_interval, 15);
        assert_eq!(updates.name.as_str(), "Bright Smile");
        assert_eq!(updates.break_start.unwrap().to_string(), "12:00");
    }

    #[test]
    fn rejects_bad_interval_and_half_break() {
        let payload = UpdateTenantPayload {
            slot_interval: Some(3),
            ..UpdateTenantPayload::default()
        };
        assert!(matches!(
            payload.apply(&tenant()),
            Err(FormError::Validation(_))
        ));

        let payload = UpdateTenantPayload {
            break_start: Some("12:00".to_string()),
            ..UpdateTenantPayload::default()
        };
        assert!(matches!(payload.apply(&tenant()), Err(FormError::Invalid(_))));

        let payload = UpdateTenantPayload {
            break_start: Some("13:00".to_string()),
            break_end: Some("12:00".to_string()),
            ..UpdateTenantPayload::default()
        };
        assert!(payload.apply(&tenant()).is_err());
    }

    #[test]
    fn create_derives_slug_from_name() {
        let payload = CreateTenantPayload {
            name: "Bright Smile Dental".to_string(),
            email: None,
            slug: None,
            timezone: None,
        };
        let tenant = payload.into_domain("org_9", "owner@example.com").unwrap();
        assert_eq!(tenant.slug.as_str(), "bright-smile-dental");
        assert_eq!(tenant.email, "owner@example.com");
        assert_eq!(tenant.org_id.as_deref(), Some("org_9"));
        assert_eq!(tenant.timezone, DEFAULT_TIMEZONE);
    }

    #[test]
    fn email_is_normalized_and_timezone_checked() {
        let payload = UpdateTenantPayload {
            email: Some("  Front.Desk@Example.COM ".to_string()),
            timezone: Some(" Europe/Berlin ".to_string()),
            ..UpdateTenantPayload::default()
        };
        let updates = payload.apply(&tenant()).unwrap();
        assert_eq!(updates.email, "front.desk@example.com");
        assert_eq!(updates.timezone, "Europe/Berlin");

        let payload = UpdateTenantPayload {
            timezone: Some("Eastern Standard".to_string()),
            ..UpdateTenantPayload::default()
        };
        assert!(payload.apply(&tenant()).is_err());

        let payload = CreateTenantPayload {
            name: "Glow Studio".to_string(),
            email: Some("not-an-email".to_string()),
            slug: None,
            timezone: None,
        };
        assert!(payload.into_domain("org_1", "owner@example.com").is_err());
    }
}
