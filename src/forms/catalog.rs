use serde::Deserialize;
use validator::Validate;

use crate::domain::catalog::{
    NewPackage, NewService, UpdatePackage, UpdateService, validate_discount,
};
use crate::domain::types::{ServiceId, ServiceName, TenantId};
use crate::forms::{FormError, clean_text};

#[derive(Debug, Deserialize, Validate)]
pub struct ServicePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Minutes, in 15 minute steps.
    #[validate(range(min = 15, max = 480))]
    pub duration: i32,
    #[validate(range(min = 0))]
    pub price_cents: i32,
    pub active: Option<bool>,
}

impl ServicePayload {
    fn checked(self) -> Result<(ServiceName, Option<String>, i32, i32, bool), FormError> {
        self.validate()?;
        if self.duration % 15 != 0 {
            return Err(FormError::Invalid(
                "duration must be a multiple of 15 minutes".to_string(),
            ));
        }
        Ok((
            ServiceName::new(self.name)?,
            clean_text(self.description),
            self.duration,
            self.price_cents,
            self.active.unwrap_or(true),
        ))
    }

    pub fn into_new(self, tenant_id: TenantId) -> Result<NewService, FormError> {
        let (name, description, duration_minutes, price_cents, active) = self.checked()?;
        Ok(NewService {
            tenant_id,
            name,
            description,
            duration_minutes,
            price_cents,
            active,
        })
    }

    pub fn into_update(self) -> Result<UpdateService, FormError> {
        let (name, description, duration_minutes, price_cents, active) = self.checked()?;
        Ok(UpdateService {
            name,
            description,
            duration_minutes,
            price_cents,
            active,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PackagePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub discount_percent: i32,
    #[validate(range(min = 0))]
    pub override_price_cents: Option<i32>,
    pub active: Option<bool>,
    #[validate(length(min = 1, message = "a package needs at least one service"))]
    pub service_ids: Vec<i32>,
}

impl PackagePayload {
    fn service_ids(ids: &[i32]) -> Result<Vec<ServiceId>, FormError> {
        let mut out: Vec<ServiceId> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = ServiceId::new(*id)?;
            if !out.contains(&id) {
                out.push(id);
            }
        }
        Ok(out)
    }

    pub fn into_new(self, tenant_id: TenantId) -> Result<NewPackage, FormError> {
        self.validate()?;
        Ok(NewPackage {
            tenant_id,
            service_ids: Self::service_ids(&self.service_ids)?,
            name: ServiceName::new(self.name)?,
            description: clean_text(self.description),
            discount_percent: validate_discount(self.discount_percent)?,
            override_price_cents: self.override_price_cents,
            active: self.active.unwrap_or(true),
        })
    }

    pub fn into_update(self) -> Result<UpdatePackage, FormError> {
        self.validate()?;
        Ok(UpdatePackage {
            service_ids: Self::service_ids(&self.service_ids)?,
            name: ServiceName::new(self.name)?,
            description: clean_text(self.description),
            discount_percent: validate_discount(self.discount_percent)?,
            override_price_cents: self.override_price_cents,
            active: self.active.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(duration: i32) -> ServicePayload {
        ServicePayload {
            name: "Cleaning".to_string(),
            description: Some("<b>Deep</b> clean".to_string()),
            duration,
            price_cents: 12_000,
            active: None,
        }
    }

    #[test]
    fn service_duration_must_be_quarter_hours() {
        let tenant = TenantId::new(1).unwrap();
        let created = service(45).into_new(tenant).unwrap();
        assert!(created.active);
        assert_eq!(created.duration_minutes, 45);
        assert!(matches!(
            service(50).into_new(tenant),
            Err(FormError::Invalid(_))
        ));
        assert!(matches!(
            service(10).into_new(tenant),
            Err(FormError::Validation(_))
        ));
    }

    #[test]
    fn package_rejects_unknown_discount_and_dedups_services() {
        let payload = |discount| PackagePayload {
            name: "Combo".to_string(),
            description: None,
            discount_percent: discount,
            override_price_cents: None,
            active: Some(false),
            service_ids: vec![2, 3, 2],
        };
        let tenant = TenantId::new(1).unwrap();
        let package = payload(10).into_new(tenant).unwrap();
        assert_eq!(package.service_ids.len(), 2);
        assert!(!package.active);
        assert!(matches!(
            payload(12).into_new(tenant),
            Err(FormError::Constraint(_))
        ));
    }
}
