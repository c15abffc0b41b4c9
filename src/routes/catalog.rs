use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::{PackageId, ServiceId};
use crate::dto::Success;
use crate::forms::catalog::{PackagePayload, ServicePayload};
use crate::repository::DieselRepository;
use crate::services::{ServiceError, catalog};

#[get("/services")]
pub async fn list_services(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let services = catalog::list_services(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(services))
}

#[post("/services")]
pub async fn create_service(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<ServicePayload>,
) -> Result<HttpResponse, ServiceError> {
    let service = catalog::create_service(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(service))
}

#[get("/services/{id}")]
pub async fn show_service(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ServiceId::new(id.into_inner())?;
    let service = catalog::get_service(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(service))
}

#[put("/services/{id}")]
pub async fn update_service(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<ServicePayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = ServiceId::new(id.into_inner())?;
    let service = catalog::update_service(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(service))
}

#[delete("/services/{id}")]
pub async fn delete_service(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ServiceId::new(id.into_inner())?;
    catalog::delete_service(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}

#[get("/packages")]
pub async fn list_packages(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let packages = catalog::list_packages(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(packages))
}

#[post("/packages")]
pub async fn create_package(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<PackagePayload>,
) -> Result<HttpResponse, ServiceError> {
    let package = catalog::create_package(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(package))
}

#[get("/packages/{id}")]
pub async fn show_package(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = PackageId::new(id.into_inner())?;
    let package = catalog::get_package(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(package))
}

#[put("/packages/{id}")]
pub async fn update_package(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<PackagePayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = PackageId::new(id.into_inner())?;
    let package = catalog::update_package(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(package))
}

#[delete("/packages/{id}")]
pub async fn delete_package(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = PackageId::new(id.into_inner())?;
    catalog::delete_package(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
