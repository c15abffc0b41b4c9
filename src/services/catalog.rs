//! Services and packages offered for booking.

use crate::domain::catalog::Service;
use crate::domain::types::{PackageId, ServiceId, TenantId};
use crate::dto::catalog::PackageView;
use crate::forms::catalog::{PackagePayload, ServicePayload};
use crate::repository::{PackageReader, PackageWriter, ServiceReader, ServiceWriter};
use crate::services::{ServiceError, ServiceResult};

pub fn list_services<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<Service>>
where
    R: ServiceReader + ?Sized,
{
    Ok(repo.list_services(tenant_id, false)?)
}

pub fn get_service<R>(repo: &R, tenant_id: TenantId, id: ServiceId) -> ServiceResult<Service>
where
    R: ServiceReader + ?Sized,
{
    repo.get_service_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Service"))
}

pub fn create_service<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: ServicePayload,
) -> ServiceResult<Service>
where
    R: ServiceWriter + ?Sized,
{
    let new_service = payload.into_new(tenant_id)?;
    repo.create_service(&new_service).map_err(|err| {
        log::error!("Failed to create service: {err}");
        err.into()
    })
}

pub fn update_service<R>(
    repo: &R,
    tenant_id: TenantId,
    id: ServiceId,
    payload: ServicePayload,
) -> ServiceResult<Service>
where
    R: ServiceReader + ServiceWriter + ?Sized,
{
    get_service(repo, tenant_id, id)?;
    let updates = payload.into_update()?;
    Ok(repo.update_service(id, tenant_id, &updates)?)
}

/// Deletes a service. Existing bookings keep their price and duration.
pub fn delete_service<R>(repo: &R, tenant_id: TenantId, id: ServiceId) -> ServiceResult<()>
where
    R: ServiceReader + ServiceWriter + ?Sized,
{
    get_service(repo, tenant_id, id)?;
    Ok(repo.delete_service(id, tenant_id)?)
}

fn ensure_services_exist<R>(repo: &R, tenant_id: TenantId, ids: &[ServiceId]) -> ServiceResult<()>
where
    R: ServiceReader + ?Sized,
{
    for id in ids {
        if repo.get_service_by_id(*id, tenant_id)?.is_none() {
            return Err(ServiceError::Validation(format!("Service {id} does not exist")));
        }
    }
    Ok(())
}

pub fn list_packages<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<PackageView>>
where
    R: PackageReader + ?Sized,
{
    let packages = repo.list_packages(tenant_id, false)?;
    Ok(packages.into_iter().map(PackageView::from).collect())
}

pub fn get_package<R>(repo: &R, tenant_id: TenantId, id: PackageId) -> ServiceResult<PackageView>
where
    R: PackageReader + ?Sized,
{
    repo.get_package_by_id(id, tenant_id)?
        .map(PackageView::from)
        .ok_or_else(|| ServiceError::not_found("Package"))
}

pub fn create_package<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: PackagePayload,
) -> ServiceResult<PackageView>
where
    R: ServiceReader + PackageWriter + ?Sized,
{
    let new_package = payload.into_new(tenant_id)?;
    ensure_services_exist(repo, tenant_id, &new_package.service_ids)?;
    let package = repo.create_package(&new_package).map_err(|err| {
        log::error!("Failed to create package: {err}");
        err
    })?;
    Ok(package.into())
}

pub fn update_package<R>(
    repo: &R,
    tenant_id: TenantId,
    id: PackageId,
    payload: PackagePayload,
) -> ServiceResult<PackageView>
where
    R: ServiceReader + PackageReader + PackageWriter + ?Sized,
{
    get_package(repo, tenant_id, id)?;
    let updates = payload.into_update()?;
    ensure_services_exist(repo, tenant_id, &updates.service_ids)?;
    Ok(repo.update_package(id, tenant_id, &updates)?.into())
}

pub fn delete_package<R>(repo: &R, tenant_id: TenantId, id: PackageId) -> ServiceResult<()>
where
    R: PackageReader + PackageWriter + ?Sized,
{
    get_package(repo, tenant_id, id)?;
    Ok(repo.delete_package(id, tenant_id)?)
}
