use diesel::prelude::*;

use crate::domain::tenant::{NewTenant, Tenant, UpdateTenant};
use crate::domain::types::TenantId;
use crate::models::tenant::{
    NewTenant as DbNewTenant, Tenant as DbTenant, UpdateTenant as DbUpdateTenant,
};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, TenantReader, TenantWriter};
use crate::schema::tenants;

impl TenantReader for DieselRepository {
    fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>> {
        let mut conn = self.conn()?;
        let tenant = tenants::table
            .find(id.get())
            .first::<DbTenant>(&mut conn)
            .optional()?;
        Ok(tenant.map(Tenant::try_from).transpose()?)
    }

    fn get_tenant_by_slug(&self, slug: &str) -> RepositoryResult<Option<Tenant>> {
        let mut conn = self.conn()?;
        let tenant = tenants::table
            .filter(tenants::slug.eq(slug))
            .first::<DbTenant>(&mut conn)
            .optional()?;
        Ok(tenant.map(Tenant::try_from).transpose()?)
    }

    fn get_tenant_by_org_id(&self, org_id: &str) -> RepositoryResult<Option<Tenant>> {
        let mut conn = self.conn()?;
        let tenant = tenants::table
            .filter(tenants::org_id.eq(org_id))
            .first::<DbTenant>(&mut conn)
            .optional()?;
        Ok(tenant.map(Tenant::try_from).transpose()?)
    }

    fn list_tenants(&self) -> RepositoryResult<Vec<Tenant>> {
        let mut conn = self.conn()?;
        let rows = tenants::table
            .order(tenants::id.asc())
            .load::<DbTenant>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Tenant::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl TenantWriter for DieselRepository {
    fn create_tenant(&self, new_tenant: &NewTenant) -> RepositoryResult<Tenant> {
        let mut conn = self.conn()?;
        let insertable: DbNewTenant = new_tenant.into();
        let created = diesel::insert_into(tenants::table)
            .values(&insertable)
            .get_result::<DbTenant>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn update_tenant(&self, id: TenantId, updates: &UpdateTenant) -> RepositoryResult<Tenant> {
        let mut conn = self.conn()?;
        let changes: DbUpdateTenant = updates.into();
        let updated = diesel::update(tenants::table.find(id.get()))
            .set(&changes)
            .get_result::<DbTenant>(&mut conn)?;
        Ok(updated.try_into()?)
    }
}
