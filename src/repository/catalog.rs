use diesel::prelude::*;

use crate::domain::catalog::{
    NewPackage, NewService, Package, Service, UpdatePackage, UpdateService,
};
use crate::domain::types::{PackageId, ServiceId, TenantId};
use crate::models::catalog::{
    NewPackage as DbNewPackage, NewService as DbNewService, Package as DbPackage,
    PackageService, Service as DbService, UpdatePackage as DbUpdatePackage,
    UpdateService as DbUpdateService,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, PackageReader, PackageWriter, ServiceReader, ServiceWriter,
};
use crate::schema::{package_services, packages, services};

fn package_with_services(
    conn: &mut SqliteConnection,
    row: DbPackage,
) -> RepositoryResult<Package> {
    let included = services::table
        .inner_join(package_services::table)
        .filter(package_services::package_id.eq(row.id))
        .select(DbService::as_select())
        .order(services::id.asc())
        .load::<DbService>(conn)?
        .into_iter()
        .map(Service::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(row.into_domain(included)?)
}

/// Replaces the package's service links with services that belong to the
/// same tenant.
fn link_services(
    conn: &mut SqliteConnection,
    package_id: i32,
    tenant_id: i32,
    service_ids: &[ServiceId],
) -> QueryResult<()> {
    let ids: Vec<i32> = service_ids.iter().map(|id| id.get()).collect();
    let owned: Vec<i32> = services::table
        .filter(services::tenant_id.eq(tenant_id))
        .filter(services::id.eq_any(&ids))
        .select(services::id)
        .load(conn)?;

    diesel::delete(package_services::table.filter(package_services::package_id.eq(package_id)))
        .execute(conn)?;

    let links: Vec<PackageService> = owned
        .into_iter()
        .map(|service_id| PackageService {
            package_id,
            service_id,
        })
        .collect();
    if !links.is_empty() {
        diesel::insert_into(package_services::table)
            .values(&links)
            .execute(conn)?;
    }
    Ok(())
}

impl ServiceReader for DieselRepository {
    fn get_service_by_id(
        &self,
        id: ServiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Service>> {
        let mut conn = self.conn()?;
        let row = services::table
            .filter(services::id.eq(id.get()))
            .filter(services::tenant_id.eq(tenant_id.get()))
            .first::<DbService>(&mut conn)
            .optional()?;
        Ok(row.map(Service::try_from).transpose()?)
    }

    fn list_services(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> RepositoryResult<Vec<Service>> {
        let mut conn = self.conn()?;
        let mut query = services::table
            .filter(services::tenant_id.eq(tenant_id.get()))
            .into_boxed();
        if active_only {
            query = query.filter(services::active.eq(true));
        }
        let rows = query.order(services::name.asc()).load::<DbService>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Service::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ServiceWriter for DieselRepository {
    fn create_service(&self, new_service: &NewService) -> RepositoryResult<Service> {
        let mut conn = self.conn()?;
        let insertable: DbNewService = new_service.into();
        let created = diesel::insert_into(services::table)
            .values(&insertable)
            .get_result::<DbService>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn update_service(
        &self,
        id: ServiceId,
        tenant_id: TenantId,
        updates: &UpdateService,
    ) -> RepositoryResult<Service> {
        let mut conn = self.conn()?;
        let changes: DbUpdateService = updates.into();
        let updated = diesel::update(
            services::table
                .filter(services::id.eq(id.get()))
                .filter(services::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbService>(&mut conn)?;
        Ok(updated.try_into()?)
    }

    fn delete_service(&self, id: ServiceId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            services::table
                .filter(services::id.eq(id.get()))
                .filter(services::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl PackageReader for DieselRepository {
    fn get_package_by_id(
        &self,
        id: PackageId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Package>> {
        let mut conn = self.conn()?;
        let row = packages::table
            .filter(packages::id.eq(id.get()))
            .filter(packages::tenant_id.eq(tenant_id.get()))
            .first::<DbPackage>(&mut conn)
            .optional()?;
        row.map(|row| package_with_services(&mut conn, row))
            .transpose()
    }

    fn list_packages(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> RepositoryResult<Vec<Package>> {
        let mut conn = self.conn()?;
        let mut query = packages::table
            .filter(packages::tenant_id.eq(tenant_id.get()))
            .into_boxed();
        if active_only {
            query = query.filter(packages::active.eq(true));
        }
        let rows = query.order(packages::name.asc()).load::<DbPackage>(&mut conn)?;
        rows.into_iter()
            .map(|row| package_with_services(&mut conn, row))
            .collect()
    }
}

impl PackageWriter for DieselRepository {
    fn create_package(&self, new_package: &NewPackage) -> RepositoryResult<Package> {
        let mut conn = self.conn()?;
        let insertable: DbNewPackage = new_package.into();
        let row = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let row = diesel::insert_into(packages::table)
                .values(&insertable)
                .get_result::<DbPackage>(conn)?;
            link_services(
                conn,
                row.id,
                new_package.tenant_id.get(),
                &new_package.service_ids,
            )?;
            Ok(row)
        })?;
        package_with_services(&mut conn, row)
    }

    fn update_package(
        &self,
        id: PackageId,
        tenant_id: TenantId,
        updates: &UpdatePackage,
    ) -> RepositoryResult<Package> {
        let mut conn = self.conn()?;
        let changes: DbUpdatePackage = updates.into();
        let row = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let row = diesel::update(
                packages::table
                    .filter(packages::id.eq(id.get()))
                    .filter(packages::tenant_id.eq(tenant_id.get())),
            )
            .set(&changes)
            .get_result::<DbPackage>(conn)?;
            link_services(conn, row.id, tenant_id.get(), &updates.service_ids)?;
            Ok(row)
        })?;
        package_with_services(&mut conn, row)
    }

    fn delete_package(&self, id: PackageId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            packages::table
                .filter(packages::id.eq(id.get()))
                .filter(packages::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
