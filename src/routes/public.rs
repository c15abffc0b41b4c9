//! Endpoints of the embeddable booking widget. No authentication.

use actix_web::{HttpResponse, get, post, web};

use crate::forms::public::{AvailabilityParams, PublicBookingPayload, PublicLeadPayload};
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, public};

#[get("/booking/{token}")]
pub async fn get_booking(
    repo: web::Data<DieselRepository>,
    token: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let booking = public::get_booking(repo.get_ref(), &token)?;
    Ok(HttpResponse::Ok().json(booking))
}

#[post("/booking/{token}/cancel")]
pub async fn cancel_booking(
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    token: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let booking = public::cancel_booking(repo.get_ref(), &notifier, &token)?;
    Ok(HttpResponse::Ok().json(booking))
}

#[get("/{slug}")]
pub async fn tenant_profile(
    repo: web::Data<DieselRepository>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let tenant = public::tenant_profile(repo.get_ref(), &slug)?;
    Ok(HttpResponse::Ok().json(tenant))
}

#[get("/{slug}/availability")]
pub async fn availability(
    repo: web::Data<DieselRepository>,
    slug: web::Path<String>,
    params: web::Query<AvailabilityParams>,
) -> Result<HttpResponse, ServiceError> {
    let availability = public::availability(repo.get_ref(), &slug, params.into_inner())?;
    Ok(HttpResponse::Ok().json(availability))
}

#[post("/{slug}/book")]
pub async fn book(
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    slug: web::Path<String>,
    web::Json(payload): web::Json<PublicBookingPayload>,
) -> Result<HttpResponse, ServiceError> {
    let booking = public::book(repo.get_ref(), &notifier, &slug, payload)?;
    Ok(HttpResponse::Created().json(booking))
}

#[post("/{slug}/lead")]
pub async fn capture_lead(
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
    slug: web::Path<String>,
    web::Json(payload): web::Json<PublicLeadPayload>,
) -> Result<HttpResponse, ServiceError> {
    let lead = public::capture_lead(repo.get_ref(), &notifier, &slug, payload)?;
    Ok(HttpResponse::Ok().json(lead))
}
