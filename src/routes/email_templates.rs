use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::EmailTemplateId;
use crate::dto::Success;
use crate::forms::email_template::{EmailTemplatePayload, TestEmailPayload};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, email_templates};

#[get("/email-templates")]
pub async fn list_templates(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let templates = email_templates::list_templates(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(templates))
}

#[post("/email-templates")]
pub async fn create_template(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<EmailTemplatePayload>,
) -> Result<HttpResponse, ServiceError> {
    let template = email_templates::create_template(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(template))
}

/// Adds the built-in templates the tenant is missing.
#[post("/email-templates/seed")]
pub async fn seed_templates(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let created = email_templates::seed_templates(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(created))
}

#[get("/email-templates/{id}")]
pub async fn show_template(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = EmailTemplateId::new(id.into_inner())?;
    let template = email_templates::get_template(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(template))
}

#[put("/email-templates/{id}")]
pub async fn update_template(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<EmailTemplatePayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = EmailTemplateId::new(id.into_inner())?;
    let template = email_templates::update_template(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(template))
}

#[delete("/email-templates/{id}")]
pub async fn delete_template(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = EmailTemplateId::new(id.into_inner())?;
    email_templates::delete_template(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}

#[post("/email-templates/{id}/test")]
pub async fn send_test(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    payload: Option<web::Json<TestEmailPayload>>,
) -> Result<HttpResponse, ServiceError> {
    let id = EmailTemplateId::new(id.into_inner())?;
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();
    let email =
        email_templates::send_test(repo.get_ref(), &notifier, ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(email))
}
