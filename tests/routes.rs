use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use bookflow::domain::availability::NewWeeklyHours;
use bookflow::domain::catalog::NewService;
use bookflow::domain::tenant::{NewTenant, Tenant};
use bookflow::domain::types::{ClockTime, ContactId, ServiceName, TenantName, TenantSlug};
use bookflow::email::{EmailError, EmailSender, OutgoingEmail};
use bookflow::models::config::ServerConfig;
use bookflow::ratelimit::{InMemoryRateLimiter, SharedRateLimiter};
use bookflow::repository::{
    AvailabilityWriter, ContactReader, DieselRepository, ServiceWriter, TenantWriter,
};
use bookflow::routes;
use bookflow::services::Notifier;
use bookflow::webhooks::{WebhookDispatcher, WebhookError, WebhookJob};
use serde_json::{Value, json};

mod common;

const INTERNAL_KEY: &str = "internal-test-key";
const CRON_SECRET: &str = "cron-test-secret";

#[derive(Default)]
struct NullDispatcher;

impl WebhookDispatcher for NullDispatcher {
    fn dispatch(&self, _job: WebhookJob) -> Result<(), WebhookError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl EmailSender for RecordingSender {
    fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

fn server_config() -> ServerConfig {
    ServerConfig {
        domain: "localhost".to_string(),
        address: "127.0.0.1".to_string(),
        port: 8080,
        database_url: String::new(),
        db_max_connections: 4,
        db_busy_timeout_ms: 5_000,
        secret: "test-secret".to_string(),
        auth_service_url: "http://localhost/auth".to_string(),
        app_url: "https://book.test".to_string(),
        cron_secret: Some(CRON_SECRET.to_string()),
        internal_api_key: Some(INTERNAL_KEY.to_string()),
        email_api_url: None,
        email_api_key: None,
        email_from: "Test <test@localhost>".to_string(),
        rate_limit_requests: 1_000,
        rate_limit_window_secs: 60,
        jobs_interval_secs: 60,
    }
}

fn seed_tenant(repo: &DieselRepository) -> Tenant {
    let tenant = repo
        .create_tenant(&NewTenant {
            org_id: None,
            slug: TenantSlug::new("glow-studio").unwrap(),
            name: TenantName::new("Glow Studio").unwrap(),
            email: "owner@glow.test".to_string(),
            timezone: "UTC".to_string(),
        })
        .unwrap();
    let hours: Vec<NewWeeklyHours> = (0..7)
        .map(|day| {
            NewWeeklyHours::try_new(
                day,
                ClockTime::parse("08:00").unwrap(),
                ClockTime::parse("20:00").unwrap(),
                true,
            )
            .unwrap()
        })
        .collect();
    repo.replace_weekly_hours(tenant.id, &hours).unwrap();
    tenant
}

macro_rules! app {
    ($repo:expr, $sender:expr, $limit:expr) => {{
        let notifier = Notifier::new(
            Arc::new(NullDispatcher),
            $sender.clone(),
            "https://book.test",
        );
        let limiter: SharedRateLimiter =
            Arc::new(InMemoryRateLimiter::new($limit, Duration::from_secs(60)));
        test::init_service(
            App::new()
                .wrap(IdentityMiddleware::default())
                .wrap(SessionMiddleware::new(
                    CookieSessionStore::default(),
                    Key::from(server_config().secret.repeat(8).as_bytes()),
                ))
                .configure(routes::configure)
                .app_data(web::Data::new($repo.clone()))
                .app_data(web::Data::new(notifier))
                .app_data(web::Data::new(limiter))
                .app_data(web::Data::new(server_config())),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_health_is_public() {
    let test_db = common::TestDb::new("test_health_is_public.db");
    let repo = DieselRepository::new(test_db.pool());
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_api_requires_credentials() {
    let test_db = common::TestDb::new("test_api_requires_credentials.db");
    let repo = DieselRepository::new(test_db.pool());
    seed_tenant(&repo);
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::get().uri("/api/contacts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(("X-API-Key", "bf_not_a_real_key"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_contacts_are_created_and_listed() {
    let test_db = common::TestDb::new("test_contacts_are_created_and_listed.db");
    let repo = DieselRepository::new(test_db.pool());
    seed_tenant(&repo);
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("X-API-Key", INTERNAL_KEY))
        .insert_header(("X-Tenant-Slug", "glow-studio"))
        .set_json(json!({ "name": "Ada Lovelace", "email": "ada@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("X-API-Key", INTERNAL_KEY))
        .insert_header(("X-Tenant-Slug", "glow-studio"))
        .set_json(json!({ "name": "", "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(("X-API-Key", INTERNAL_KEY))
        .insert_header(("X-Tenant-Slug", "glow-studio"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["email"], "ada@example.com");
}

#[actix_web::test]
async fn test_cron_requires_secret() {
    let test_db = common::TestDb::new("test_cron_requires_secret.db");
    let repo = DieselRepository::new(test_db.pool());
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::post()
        .uri("/api/cron/process-workflows")
        .insert_header(("Authorization", "Bearer wrong"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/cron/send-booking-reminders")
        .insert_header(("Authorization", format!("Bearer {CRON_SECRET}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sent"], 0);
    assert_eq!(body["scheduled"], 0);
}

#[actix_web::test]
async fn test_public_booking_flow() {
    let test_db = common::TestDb::new("test_public_booking_flow.db");
    let repo = DieselRepository::new(test_db.pool());
    let tenant = seed_tenant(&repo);
    let service = repo
        .create_service(&NewService {
            tenant_id: tenant.id,
            name: ServiceName::new("Facial").unwrap(),
            description: None,
            duration_minutes: 60,
            price_cents: 12_000,
            active: true,
        })
        .unwrap();
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let day = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
    let slot = format!("{}T10:00", day.format("%Y-%m-%d"));

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/public/glow-studio/availability?date={}&service_id={}",
            day.format("%Y-%m-%d"),
            service.id
        ))
        .to_request();
    let availability: Value = test::call_and_read_body_json(&app, req).await;
    let slots = availability["slots"].as_array().unwrap();
    assert!(slots.iter().any(|s| s == "10:00"));

    let booking_payload = json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "service_id": service.id,
        "scheduled_at": slot,
    });
    let req = test::TestRequest::post()
        .uri("/api/public/glow-studio/book")
        .set_json(&booking_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booking: Value = test::read_body_json(resp).await;
    assert_eq!(booking["status"], "inquiry");
    assert_eq!(booking["can_cancel"], true);
    let token = booking["token"].as_str().unwrap().to_string();

    // The same slot cannot be taken twice.
    let req = test::TestRequest::post()
        .uri("/api/public/glow-studio/book")
        .set_json(&booking_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/public/booking/{token}"))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["item_name"], "Facial");

    let req = test::TestRequest::post()
        .uri(&format!("/api/public/booking/{token}/cancel"))
        .to_request();
    let cancelled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["can_cancel"], false);

    assert!(!sender.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn test_public_lead_is_saved_once() {
    let test_db = common::TestDb::new("test_public_lead_is_saved_once.db");
    let repo = DieselRepository::new(test_db.pool());
    seed_tenant(&repo);
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::post()
        .uri("/api/public/glow-studio/lead")
        .set_json(json!({ "name": "Grace Hopper", "email": " Grace@Example.com " }))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["is_new_contact"], true);
    assert_eq!(saved["contact"]["email"], "grace@example.com");
    let contact_id = ContactId::new(saved["contact"]["id"].as_i64().unwrap() as i32).unwrap();
    let tags = repo.list_contact_tags(contact_id).unwrap();
    assert!(tags.iter().any(|t| t.name.as_str() == "Auto-Saved Lead"));

    let req = test::TestRequest::post()
        .uri("/api/public/glow-studio/lead")
        .set_json(json!({ "name": "Grace B. Hopper", "email": "grace@example.com" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["is_new_contact"], false);
    assert_eq!(updated["contact"]["name"], "Grace B. Hopper");

    let req = test::TestRequest::post()
        .uri("/api/public/glow-studio/lead")
        .set_json(json!({ "name": "Nobody", "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unknown_public_tenant_is_not_found() {
    let test_db = common::TestDb::new("test_unknown_public_tenant_is_not_found.db");
    let repo = DieselRepository::new(test_db.pool());
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 1_000);

    let req = test::TestRequest::get()
        .uri("/api/public/nobody-here")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_public_endpoints_are_rate_limited() {
    let test_db = common::TestDb::new("test_public_endpoints_are_rate_limited.db");
    let repo = DieselRepository::new(test_db.pool());
    seed_tenant(&repo);
    let sender = Arc::new(RecordingSender::default());
    let app = app!(repo, sender, 2);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/api/public/glow-studio")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let req = test::TestRequest::get()
        .uri("/api/public/glow-studio")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
