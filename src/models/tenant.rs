use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::tenant::{
    NewTenant as DomainNewTenant, Tenant as DomainTenant, UpdateTenant as DomainUpdateTenant,
};
use crate::domain::types::{ClockTime, TenantId, TenantName, TenantSlug, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tenants)]
/// Diesel model for [`crate::domain::tenant::Tenant`].
pub struct Tenant {
    pub id: i32,
    pub org_id: Option<String>,
    pub slug: String,
    pub name: String,
    pub email: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub business_website: Option<String>,
    pub timezone: String,
    pub slot_interval: i32,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tenants)]
pub struct NewTenant<'a> {
    pub org_id: Option<&'a str>,
    pub slug: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub timezone: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::tenants)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateTenant<'a> {
    pub slug: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub business_phone: Option<&'a str>,
    pub business_address: Option<&'a str>,
    pub business_website: Option<&'a str>,
    pub timezone: &'a str,
    pub slot_interval: i32,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Tenant> for DomainTenant {
    type Error = TypeConstraintError;

    fn try_from(tenant: Tenant) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TenantId::try_from(tenant.id)?,
            org_id: tenant.org_id,
            slug: TenantSlug::new(tenant.slug)?,
            name: TenantName::new(tenant.name)?,
            email: tenant.email,
            business_phone: tenant.business_phone,
            business_address: tenant.business_address,
            business_website: tenant.business_website,
            timezone: tenant.timezone,
            slot_interval: tenant.slot_interval,
            break_start: tenant.break_start.as_deref().map(ClockTime::parse).transpose()?,
            break_end: tenant.break_end.as_deref().map(ClockTime::parse).transpose()?,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewTenant> for NewTenant<'a> {
    fn from(tenant: &'a DomainNewTenant) -> Self {
        Self {
            org_id: tenant.org_id.as_deref(),
            slug: tenant.slug.as_str(),
            name: tenant.name.as_str(),
            email: &tenant.email,
            timezone: &tenant.timezone,
        }
    }
}

impl<'a> From<&'a DomainUpdateTenant> for UpdateTenant<'a> {
    fn from(tenant: &'a DomainUpdateTenant) -> Self {
        Self {
            slug: tenant.slug.as_str(),
            name: tenant.name.as_str(),
            email: &tenant.email,
            business_phone: tenant.business_phone.as_deref(),
            business_address: tenant.business_address.as_deref(),
            business_website: tenant.business_website.as_deref(),
            timezone: &tenant.timezone,
            slot_interval: tenant.slot_interval,
            break_start: tenant.break_start.map(String::from),
            break_end: tenant.break_end.map(String::from),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_bad_break_time_is_rejected() {
        let now = chrono::Utc::now().naive_utc();
        let row = Tenant {
            id: 1,
            org_id: Some("org_1".to_string()),
            slug: "studio".to_string(),
            name: "Studio".to_string(),
            email: "owner@studio.test".to_string(),
            business_phone: None,
            business_address: None,
            business_website: None,
            timezone: "UTC".to_string(),
            slot_interval: 30,
            break_start: Some("12:00".to_string()),
            break_end: Some("noon".to_string()),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            DomainTenant::try_from(row).unwrap_err(),
            TypeConstraintError::InvalidTime
        );
    }
}
