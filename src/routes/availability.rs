use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::dto::Success;
use crate::forms::availability::{
    OverrideListParams, OverridePayload, WeeklyHoursPayload, WeeklySchedulePayload,
};
use crate::repository::DieselRepository;
use crate::services::{ServiceError, availability};

#[get("/availability")]
pub async fn list_weekly_hours(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let hours = availability::list_weekly_hours(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(hours))
}

#[post("/availability")]
pub async fn set_day_hours(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<WeeklyHoursPayload>,
) -> Result<HttpResponse, ServiceError> {
    let hours = availability::set_day_hours(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Ok().json(hours))
}

#[put("/availability")]
pub async fn replace_weekly_hours(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<WeeklySchedulePayload>,
) -> Result<HttpResponse, ServiceError> {
    let hours = availability::replace_weekly_hours(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Ok().json(hours))
}

#[get("/availability/overrides")]
pub async fn list_overrides(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    params: web::Query<OverrideListParams>,
) -> Result<HttpResponse, ServiceError> {
    let overrides =
        availability::list_overrides(repo.get_ref(), ctx.tenant.id, params.into_inner())?;
    Ok(HttpResponse::Ok().json(overrides))
}

#[post("/availability/overrides")]
pub async fn set_override(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<OverridePayload>,
) -> Result<HttpResponse, ServiceError> {
    let date_override = availability::set_override(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Ok().json(date_override))
}

#[delete("/availability/overrides/{id}")]
pub async fn delete_override(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    availability::delete_override(repo.get_ref(), ctx.tenant.id, id.into_inner())?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
