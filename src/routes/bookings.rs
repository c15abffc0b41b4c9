use actix_web::{HttpResponse, delete, get, patch, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::BookingId;
use crate::dto::Success;
use crate::forms::booking::{BookingListParams, BookingPayload, BookingStatusPayload};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, bookings};

#[get("/bookings")]
pub async fn list_bookings(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    params: web::Query<BookingListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = bookings::list_bookings(repo.get_ref(), ctx.tenant.id, params.into_inner())?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/bookings")]
pub async fn create_booking(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    web::Json(payload): web::Json<BookingPayload>,
) -> Result<HttpResponse, ServiceError> {
    let booking = bookings::create_booking(repo.get_ref(), &notifier, &ctx.tenant, payload)?;
    Ok(HttpResponse::Created().json(booking))
}

#[get("/bookings/{id}")]
pub async fn show_booking(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = BookingId::new(id.into_inner())?;
    let booking = bookings::get_booking(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(booking))
}

#[put("/bookings/{id}")]
pub async fn update_booking(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<BookingPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = BookingId::new(id.into_inner())?;
    let booking = bookings::update_booking(repo.get_ref(), &notifier, &ctx.tenant, id, payload)?;
    Ok(HttpResponse::Ok().json(booking))
}

#[patch("/bookings/{id}/status")]
pub async fn update_booking_status(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<BookingStatusPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = BookingId::new(id.into_inner())?;
    let booking = bookings::update_booking_status(
        repo.get_ref(),
        &notifier,
        &ctx.tenant,
        id,
        payload.status,
    )?;
    Ok(HttpResponse::Ok().json(booking))
}

#[delete("/bookings/{id}")]
pub async fn delete_booking(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = BookingId::new(id.into_inner())?;
    bookings::delete_booking(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
