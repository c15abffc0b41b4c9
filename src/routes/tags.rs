use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::TagId;
use crate::dto::Success;
use crate::forms::tag::TagPayload;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, tags};

#[get("/tags")]
pub async fn list_tags(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let tags = tags::list_tags(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(tags))
}

#[post("/tags")]
pub async fn create_tag(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<TagPayload>,
) -> Result<HttpResponse, ServiceError> {
    let tag = tags::create_tag(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(tag))
}

#[put("/tags/{id}")]
pub async fn update_tag(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<TagPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = TagId::new(id.into_inner())?;
    let tag = tags::update_tag(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(tag))
}

#[delete("/tags/{id}")]
pub async fn delete_tag(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = TagId::new(id.into_inner())?;
    tags::delete_tag(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
