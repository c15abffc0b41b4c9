//! JSON HTTP API.
//!
//! Handlers are thin: they extract the caller's tenant, hand the payload to
//! a service function and serialize what comes back. Errors render through
//! [`ServiceError`]'s `ResponseError` implementation.

use actix_web::middleware::from_fn;
use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use crate::ratelimit::rate_limit;
use crate::services::ServiceError;

pub mod api_keys;
pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod contacts;
pub mod cron;
pub mod email_templates;
pub mod invoices;
pub mod payments;
pub mod public;
pub mod tags;
pub mod tenant;
pub mod webhooks;
pub mod workflows;

/// Largest accepted request body, sized for CSV contact imports.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| ServiceError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ServiceError::Validation(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| ServiceError::NotFound("Not found".to_string()).into())
}

/// Registers every route of the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .service(health)
        .service(
            web::scope("/api/public")
                .wrap(from_fn(rate_limit))
                .service(public::get_booking)
                .service(public::cancel_booking)
                .service(public::tenant_profile)
                .service(public::availability)
                .service(public::capture_lead)
                .service(public::book),
        )
        .service(
            web::scope("/api/cron")
                .service(cron::process_workflows)
                .service(cron::send_booking_reminders),
        )
        .service(
            web::scope("/api")
                .wrap(from_fn(rate_limit))
                .service(tenant::show_tenant)
                .service(tenant::provision_tenant)
                .service(tenant::update_tenant)
                .service(contacts::import_contacts)
                .service(contacts::list_contacts)
                .service(contacts::create_contact)
                .service(contacts::show_contact)
                .service(contacts::update_contact)
                .service(contacts::delete_contact)
                .service(contacts::replace_fields)
                .service(contacts::list_contact_tags)
                .service(contacts::add_contact_tag)
                .service(contacts::remove_contact_tag)
                .service(catalog::list_services)
                .service(catalog::create_service)
                .service(catalog::show_service)
                .service(catalog::update_service)
                .service(catalog::delete_service)
                .service(catalog::list_packages)
                .service(catalog::create_package)
                .service(catalog::show_package)
                .service(catalog::update_package)
                .service(catalog::delete_package)
                .service(bookings::list_bookings)
                .service(bookings::create_booking)
                .service(bookings::show_booking)
                .service(bookings::update_booking)
                .service(bookings::delete_booking)
                .service(bookings::update_booking_status)
                .service(availability::list_overrides)
                .service(availability::set_override)
                .service(availability::delete_override)
                .service(availability::list_weekly_hours)
                .service(availability::set_day_hours)
                .service(availability::replace_weekly_hours)
                .service(invoices::list_invoices)
                .service(invoices::create_invoice)
                .service(invoices::show_invoice)
                .service(invoices::update_invoice)
                .service(invoices::delete_invoice)
                .service(invoices::send_invoice)
                .service(invoices::record_payment)
                .service(payments::list_payments)
                .service(payments::show_payment)
                .service(payments::refund_payment)
                .service(tags::list_tags)
                .service(tags::create_tag)
                .service(tags::update_tag)
                .service(tags::delete_tag)
                .service(webhooks::list_webhooks)
                .service(webhooks::create_webhook)
                .service(webhooks::show_webhook)
                .service(webhooks::update_webhook)
                .service(webhooks::delete_webhook)
                .service(webhooks::list_deliveries)
                .service(workflows::list_workflows)
                .service(workflows::create_workflow)
                .service(workflows::show_workflow)
                .service(workflows::update_workflow)
                .service(workflows::delete_workflow)
                .service(email_templates::seed_templates)
                .service(email_templates::list_templates)
                .service(email_templates::create_template)
                .service(email_templates::show_template)
                .service(email_templates::update_template)
                .service(email_templates::delete_template)
                .service(email_templates::send_test)
                .service(api_keys::list_api_keys)
                .service(api_keys::create_api_key)
                .service(api_keys::delete_api_key),
        );
}
