//! Scheduler entry points. Callers authenticate with the cron bearer secret.

use actix_web::{HttpResponse, post, web};
use chrono::Utc;

use crate::auth::CronAuth;
use crate::repository::DieselRepository;
use crate::services::{Notifier, ServiceError, reminders, workflows};

#[post("/process-workflows")]
pub async fn process_workflows(
    _cron: CronAuth,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ServiceError> {
    let report = workflows::process_pending_runs(repo.get_ref(), &notifier, Utc::now())?;
    Ok(HttpResponse::Ok().json(report))
}

#[post("/send-booking-reminders")]
pub async fn send_booking_reminders(
    _cron: CronAuth,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ServiceError> {
    let report = reminders::send_due_reminders(repo.get_ref(), &notifier, Utc::now())?;
    Ok(HttpResponse::Ok().json(report))
}
