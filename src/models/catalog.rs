use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::catalog::{
    NewPackage as DomainNewPackage, NewService as DomainNewService, Package as DomainPackage,
    Service as DomainService, UpdatePackage as DomainUpdatePackage,
    UpdateService as DomainUpdateService,
};
use crate::domain::types::{PackageId, ServiceId, ServiceName, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::services)]
/// Diesel model for [`crate::domain::catalog::Service`].
pub struct Service {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::services)]
pub struct NewService<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::services)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateService<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::packages)]
/// Diesel model for [`crate::domain::catalog::Package`] without its services.
pub struct Package {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::packages)]
pub struct NewPackage<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::packages)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePackage<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub discount_percent: i32,
    pub override_price_cents: Option<i32>,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::package_services)]
pub struct PackageService {
    pub package_id: i32,
    pub service_id: i32,
}

impl TryFrom<Service> for DomainService {
    type Error = TypeConstraintError;

    fn try_from(service: Service) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ServiceId::try_from(service.id)?,
            tenant_id: TenantId::try_from(service.tenant_id)?,
            name: ServiceName::new(service.name)?,
            description: service.description,
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
            active: service.active,
            created_at: service.created_at,
            updated_at: service.updated_at,
        })
    }
}

impl Package {
    /// Builds the domain package from the row and its included services.
    pub fn into_domain(
        self,
        services: Vec<DomainService>,
    ) -> Result<DomainPackage, TypeConstraintError> {
        Ok(DomainPackage {
            id: PackageId::try_from(self.id)?,
            tenant_id: TenantId::try_from(self.tenant_id)?,
            name: ServiceName::new(self.name)?,
            description: self.description,
            discount_percent: self.discount_percent,
            override_price_cents: self.override_price_cents,
            active: self.active,
            services,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewService> for NewService<'a> {
    fn from(service: &'a DomainNewService) -> Self {
        Self {
            tenant_id: service.tenant_id.get(),
            name: service.name.as_str(),
            description: service.description.as_deref(),
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
            active: service.active,
        }
    }
}

impl<'a> From<&'a DomainUpdateService> for UpdateService<'a> {
    fn from(service: &'a DomainUpdateService) -> Self {
        Self {
            name: service.name.as_str(),
            description: service.description.as_deref(),
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
            active: service.active,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl<'a> From<&'a DomainNewPackage> for NewPackage<'a> {
    fn from(package: &'a DomainNewPackage) -> Self {
        Self {
            tenant_id: package.tenant_id.get(),
            name: package.name.as_str(),
            description: package.description.as_deref(),
            discount_percent: package.discount_percent,
            override_price_cents: package.override_price_cents,
            active: package.active,
        }
    }
}

impl<'a> From<&'a DomainUpdatePackage> for UpdatePackage<'a> {
    fn from(package: &'a DomainUpdatePackage) -> Self {
        Self {
            name: package.name.as_str(),
            description: package.description.as_deref(),
            discount_percent: package.discount_percent,
            override_price_cents: package.override_price_cents,
            active: package.active,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
