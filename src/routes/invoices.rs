use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::InvoiceId;
use crate::dto::Success;
use crate::forms::invoice::{InvoiceListParams, InvoicePayload, RecordPaymentPayload};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, invoices};

#[get("/invoices")]
pub async fn list_invoices(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    params: web::Query<InvoiceListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = invoices::list_invoices(repo.get_ref(), ctx.tenant.id, params.into_inner())?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/invoices")]
pub async fn create_invoice(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    web::Json(payload): web::Json<InvoicePayload>,
) -> Result<HttpResponse, ServiceError> {
    let invoice = invoices::create_invoice(repo.get_ref(), &notifier, ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(invoice))
}

#[get("/invoices/{id}")]
pub async fn show_invoice(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = InvoiceId::new(id.into_inner())?;
    let invoice = invoices::get_invoice(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[put("/invoices/{id}")]
pub async fn update_invoice(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<InvoicePayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = InvoiceId::new(id.into_inner())?;
    let invoice = invoices::update_invoice(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[delete("/invoices/{id}")]
pub async fn delete_invoice(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = InvoiceId::new(id.into_inner())?;
    invoices::delete_invoice(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}

#[post("/invoices/{id}/send")]
pub async fn send_invoice(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = InvoiceId::new(id.into_inner())?;
    let invoice = invoices::send_invoice(repo.get_ref(), &notifier, ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[post("/invoices/{id}/record-payment")]
pub async fn record_payment(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<RecordPaymentPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = InvoiceId::new(id.into_inner())?;
    let recorded =
        invoices::record_payment(repo.get_ref(), &notifier, ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Created().json(recorded))
}
