use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::WebhookId;
use crate::dto::Success;
use crate::forms::webhook::WebhookPayload;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, webhooks};

#[get("/webhooks")]
pub async fn list_webhooks(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let webhooks = webhooks::list_webhooks(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(webhooks))
}

#[post("/webhooks")]
pub async fn create_webhook(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<WebhookPayload>,
) -> Result<HttpResponse, ServiceError> {
    let webhook = webhooks::create_webhook(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(webhook))
}

#[get("/webhooks/{id}")]
pub async fn show_webhook(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = WebhookId::new(id.into_inner())?;
    let webhook = webhooks::get_webhook(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(webhook))
}

#[put("/webhooks/{id}")]
pub async fn update_webhook(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<WebhookPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = WebhookId::new(id.into_inner())?;
    let webhook = webhooks::update_webhook(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(webhook))
}

#[delete("/webhooks/{id}")]
pub async fn delete_webhook(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = WebhookId::new(id.into_inner())?;
    webhooks::delete_webhook(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}

#[get("/webhooks/{id}/deliveries")]
pub async fn list_deliveries(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = WebhookId::new(id.into_inner())?;
    let deliveries = webhooks::list_deliveries(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(deliveries))
}
