use actix_web::{HttpResponse, get, post, web};

use crate::auth::TenantContext;
use crate::domain::types::PaymentId;
use crate::forms::payment::{PaymentListParams, RefundPayload};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, payments};

#[get("/payments")]
pub async fn list_payments(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    params: web::Query<PaymentListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = payments::list_payments(repo.get_ref(), ctx.tenant.id, params.into_inner())?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/payments/{id}")]
pub async fn show_payment(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = PaymentId::new(id.into_inner())?;
    let payment = payments::get_payment(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(payment))
}

/// An empty body refunds everything that is left.
#[post("/payments/{id}/refund")]
pub async fn refund_payment(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    payload: Option<web::Json<RefundPayload>>,
) -> Result<HttpResponse, ServiceError> {
    let id = PaymentId::new(id.into_inner())?;
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();
    let payment = payments::refund_payment(repo.get_ref(), &notifier, ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(payment))
}
