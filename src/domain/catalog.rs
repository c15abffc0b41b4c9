//! Bookable services and discounted service packages.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{PackageId, ServiceId, ServiceName, TenantId, TypeConstraintError};

/// Discount levels a package may carry.
pub const PACKAGE_DISCOUNTS: [i32; 4] = [5, 10, 15, 20];

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub tenant_id: TenantId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewService {
    pub tenant_id: TenantId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub struct UpdateService {
    pub name: ServiceName,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Package {
    pub id: PackageId,
    pub tenant_id: TenantId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
    pub services: Vec<Service>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Package {
    /// Combined list price of the included services.
    pub fn list_price_cents(&self) -> i32 {
        self.services.iter().map(|s| s.price_cents).sum()
    }

    /// Price charged for the package: the override when set, otherwise the
    /// discounted list price.
    pub fn price_cents(&self) -> i32 {
        self.override_price_cents
            .unwrap_or_else(|| discounted_price(self.list_price_cents(), self.discount_percent))
    }

    pub fn duration_minutes(&self) -> i32 {
        self.services.iter().map(|s| s.duration_minutes).sum()
    }
}

/// Applies a whole-percent discount rounding to the nearest cent.
pub fn discounted_price(list_price_cents: i32, discount_percent: i32) -> i32 {
    let discounted = i64::from(list_price_cents) * i64::from(100 - discount_percent);
    ((discounted as f64) / 100.0).round() as i32
}

/// Rejects discount levels outside [`PACKAGE_DISCOUNTS`].
pub fn validate_discount(discount_percent: i32) -> Result<i32, TypeConstraintError> {
    if PACKAGE_DISCOUNTS.contains(&discount_percent) {
        Ok(discount_percent)
    } else {
        Err(TypeConstraintError::InvalidValue(
            "discount must be 5, 10, 15 or 20 percent".to_string(),
        ))
    }
}

#[derive(Clone, Debug)]
pub struct NewPackage {
    pub tenant_id: TenantId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
    pub service_ids: Vec<ServiceId>,
}

#[derive(Clone, Debug)]
pub struct UpdatePackage {
    pub name: ServiceName,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
    pub service_ids: Vec<ServiceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: i32, price: i32, minutes: i32) -> Service {
        let now = chrono::Utc::now().naive_utc();
        Service {
            id: ServiceId::new(id).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            name: ServiceName::new(format!("Service {id}")).unwrap(),
            description: None,
            duration_minutes: minutes,
            price_cents: price,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn package(override_price: Option<i32>) -> Package {
        let now = chrono::Utc::now().naive_utc();
        Package {
            id: PackageId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            name: ServiceName::new("Combo").unwrap(),
            description: None,
            discount_percent: 15,
            override_price_cents: override_price,
            active: true,
            services: vec![service(1, 10_000, 60), service(2, 5_000, 30)],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn package_price_applies_discount() {
        let pkg = package(None);
        assert_eq!(pkg.list_price_cents(), 15_000);
        assert_eq!(pkg.price_cents(), 12_750);
        assert_eq!(pkg.duration_minutes(), 90);
    }

    #[test]
    fn override_price_wins() {
        assert_eq!(package(Some(9_900)).price_cents(), 9_900);
    }

    #[test]
    fn only_known_discounts_are_accepted() {
        assert!(validate_discount(10).is_ok());
        assert!(validate_discount(12).is_err());
    }
}
