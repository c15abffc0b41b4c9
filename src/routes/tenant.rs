use actix_web::{HttpResponse, get, patch, post, web};

use crate::auth::{AuthenticatedUser, TenantContext};
use crate::forms::tenant::{CreateTenantPayload, UpdateTenantPayload};
use crate::repository::DieselRepository;
use crate::services::{ServiceError, tenant};

#[get("/tenant")]
pub async fn show_tenant(ctx: TenantContext) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ctx.tenant))
}

/// Creates the tenant of the signed-in user's organization.
#[post("/tenant")]
pub async fn provision_tenant(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<CreateTenantPayload>,
) -> Result<HttpResponse, ServiceError> {
    let tenant = tenant::provision_tenant(repo.get_ref(), &user, payload)?;
    Ok(HttpResponse::Created().json(tenant))
}

#[patch("/tenant")]
pub async fn update_tenant(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<UpdateTenantPayload>,
) -> Result<HttpResponse, ServiceError> {
    let tenant = tenant::update_tenant(repo.get_ref(), &ctx.tenant, payload)?;
    Ok(HttpResponse::Ok().json(tenant))
}
