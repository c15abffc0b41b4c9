use actix_web::{HttpResponse, delete, get, post, web};

use crate::auth::TenantContext;
use crate::domain::types::ApiKeyId;
use crate::dto::Success;
use crate::forms::api_key::ApiKeyPayload;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, api_keys};

#[get("/api-keys")]
pub async fn list_api_keys(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let keys = api_keys::list_api_keys(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(keys))
}

/// The response is the only place the plain key is ever shown.
#[post("/api-keys")]
pub async fn create_api_key(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<ApiKeyPayload>,
) -> Result<HttpResponse, ServiceError> {
    let created = api_keys::create_api_key(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(created))
}

#[delete("/api-keys/{id}")]
pub async fn delete_api_key(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ApiKeyId::new(id.into_inner())?;
    api_keys::delete_api_key(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
