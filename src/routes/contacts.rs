use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::{ContactId, TagId};
use crate::dto::Success;
use crate::forms::contact::{
    ContactFieldsPayload, ContactListParams, ContactPayload, ContactTagPayload,
};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, contacts};

#[get("/contacts")]
pub async fn list_contacts(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    params: web::Query<ContactListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = contacts::list_contacts(repo.get_ref(), ctx.tenant.id, params.into_inner())?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/contacts")]
pub async fn create_contact(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    web::Json(payload): web::Json<ContactPayload>,
) -> Result<HttpResponse, ServiceError> {
    let contact = contacts::create_contact(repo.get_ref(), &notifier, ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(contact))
}

/// CSV body with `name,email[,phone][,notes]` columns.
#[post("/contacts/import")]
pub async fn import_contacts(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    body: String,
) -> Result<HttpResponse, ServiceError> {
    let summary = contacts::import_contacts(repo.get_ref(), ctx.tenant.id, &body)?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/contacts/{id}")]
pub async fn show_contact(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    let contact = contacts::get_contact(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{id}")]
pub async fn update_contact(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<ContactPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    let contact =
        contacts::update_contact(repo.get_ref(), &notifier, ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(contact))
}

#[delete("/contacts/{id}")]
pub async fn delete_contact(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    contacts::delete_contact(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}

#[put("/contacts/{id}/fields")]
pub async fn replace_fields(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<ContactFieldsPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    let contact = contacts::replace_fields(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(contact))
}

#[get("/contacts/{id}/tags")]
pub async fn list_contact_tags(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    let tags = contacts::list_contact_tags(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(tags))
}

#[post("/contacts/{id}/tags")]
pub async fn add_contact_tag(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<ContactTagPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = ContactId::new(id.into_inner())?;
    let tags = contacts::add_contact_tag(repo.get_ref(), &notifier, ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(tags))
}

#[delete("/contacts/{id}/tags/{tag_id}")]
pub async fn remove_contact_tag(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (id, tag_id) = path.into_inner();
    let (id, tag_id) = (ContactId::new(id)?, TagId::new(tag_id)?);
    contacts::remove_contact_tag(repo.get_ref(), &notifier, ctx.tenant.id, id, tag_id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
