//! Business operations invoked by the HTTP routes and background jobs.
//!
//! Services are plain functions generic over the repository traits they
//! need, so each can be exercised against [`crate::repository::mock`] or a
//! small in-memory fake.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::domain::types::TenantId;
use crate::domain::webhook::WebhookEvent;
use crate::email::{EmailSender, OutgoingEmail};
use crate::forms::FormError;
use crate::repository::{DEFAULT_ITEMS_PER_PAGE, WebhookReader};
use crate::webhooks::{WebhookDispatcher, trigger_webhook};

pub mod api_keys;
pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod contacts;
pub mod email_templates;
pub mod errors;
pub mod invoices;
pub mod payments;
pub mod public;
pub mod reminders;
pub mod tags;
pub mod tenant;
pub mod webhooks;
pub mod workflows;

pub use errors::{ServiceError, ServiceResult};

/// Largest page a listing endpoint returns.
pub const MAX_ITEMS_PER_PAGE: usize = 100;

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(e) => ServiceError::from(e),
            FormError::Constraint(e) => ServiceError::TypeConstraint(e.to_string()),
            FormError::Csv(message) | FormError::Invalid(message) => {
                ServiceError::Validation(message)
            }
        }
    }
}

/// Outbound side effects: webhook deliveries and transactional email.
#[derive(Clone)]
pub struct Notifier {
    pub webhooks: Arc<dyn WebhookDispatcher>,
    pub email: Arc<dyn EmailSender>,
    /// Public base URL used for links in emails.
    pub app_url: String,
}

impl Notifier {
    pub fn new(
        webhooks: Arc<dyn WebhookDispatcher>,
        email: Arc<dyn EmailSender>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            webhooks,
            email,
            app_url: app_url.into(),
        }
    }

    /// Queues `event` for every subscribed endpoint of the tenant. Never fails.
    pub fn webhook<R>(&self, repo: &R, tenant_id: TenantId, event: WebhookEvent, data: Value)
    where
        R: WebhookReader + ?Sized,
    {
        let queued = trigger_webhook(repo, self.webhooks.as_ref(), tenant_id, event, data);
        if queued > 0 {
            log::info!("Queued {queued} webhook deliveries for {event}");
        }
    }

    /// Queues an email; returns whether it was accepted.
    pub fn send_email(&self, email: OutgoingEmail) -> bool {
        let to = email.to.clone();
        match self.email.send(email) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to queue email to {to}: {e}");
                false
            }
        }
    }
}

/// Serializes a value for a webhook payload, logging instead of failing.
pub(crate) fn to_payload<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        log::error!("Failed to serialize webhook payload: {e}");
        Value::Null
    })
}

/// Normalized `(page, per_page)` for listing endpoints.
pub(crate) fn page_params(page: Option<usize>, per_page: Option<usize>) -> (usize, usize) {
    (
        page.unwrap_or(1).max(1),
        per_page
            .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
            .clamp(1, MAX_ITEMS_PER_PAGE),
    )
}

/// Current UTC time, used for record stamps and workflow run times.
/// Calendar times come from [`Tenant::local_now`](crate::domain::tenant::Tenant::local_now).
pub fn utc_now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders and recording side-effect sinks shared by service tests.

    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    use super::Notifier;
    use crate::domain::booking::{Booking, BookingPaymentStatus, BookingStatus};
    use crate::domain::catalog::Service;
    use crate::domain::contact::{Contact, ContactStatus};
    use crate::domain::tag::Tag;
    use crate::domain::tenant::Tenant;
    use crate::domain::types::{
        BookingId, ContactEmail, ContactId, ContactName, PublicId, ServiceId, ServiceName, TagId,
        TagName, TenantId, TenantName, TenantSlug,
    };
    use crate::email::{EmailError, EmailSender, OutgoingEmail};
    use crate::webhooks::{WebhookDispatcher, WebhookError, WebhookJob};

    #[derive(Default)]
    pub struct RecordingDispatcher {
        pub jobs: Mutex<Vec<WebhookJob>>,
    }

    impl WebhookDispatcher for RecordingDispatcher {
        fn dispatch(&self, job: WebhookJob) -> Result<(), WebhookError> {
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingSender {
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    pub struct TestNotifier {
        pub notifier: Notifier,
        pub webhooks: Arc<RecordingDispatcher>,
        pub email: Arc<RecordingSender>,
    }

    pub fn notifier() -> TestNotifier {
        let webhooks = Arc::new(RecordingDispatcher::default());
        let email = Arc::new(RecordingSender::default());
        TestNotifier {
            notifier: Notifier::new(webhooks.clone(), email.clone(), "https://app.test"),
            webhooks,
            email,
        }
    }

    impl TestNotifier {
        pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
            self.email.sent.lock().unwrap().clone()
        }
    }

    pub fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    /// [`now`] as a UTC instant.
    pub fn clock() -> DateTime<Utc> {
        now().and_utc()
    }

    pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    pub fn tenant_id() -> TenantId {
        TenantId::new(1).unwrap()
    }

    pub fn tenant() -> Tenant {
        Tenant {
            id: tenant_id(),
            org_id: Some("org_1".to_string()),
            slug: TenantSlug::new("bright-smile").unwrap(),
            name: TenantName::new("Bright Smile").unwrap(),
            email: "owner@brightsmile.test".to_string(),
            business_phone: None,
            business_address: None,
            business_website: None,
            timezone: "UTC".to_string(),
            slot_interval: 30,
            break_start: None,
            break_end: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    pub fn contact(id: i32) -> Contact {
        Contact {
            id: ContactId::new(id).unwrap(),
            tenant_id: tenant_id(),
            name: ContactName::new("Ada Lovelace").unwrap(),
            email: ContactEmail::new(format!("ada{id}@example.com")).unwrap(),
            phone: None,
            notes: None,
            status: ContactStatus::Lead,
            created_at: now(),
            updated_at: now(),
            fields: None,
        }
    }

    pub fn service(id: i32, minutes: i32, price_cents: i32) -> Service {
        Service {
            id: ServiceId::new(id).unwrap(),
            tenant_id: tenant_id(),
            name: ServiceName::new(format!("Service {id}")).unwrap(),
            description: None,
            duration_minutes: minutes,
            price_cents,
            active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    pub fn booking(id: i32, scheduled_at: NaiveDateTime, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(id).unwrap(),
            tenant_id: tenant_id(),
            contact_id: ContactId::new(1).unwrap(),
            service_id: Some(ServiceId::new(1).unwrap()),
            package_id: None,
            public_id: PublicId::new(),
            scheduled_at,
            duration_minutes: 60,
            total_price_cents: 10_000,
            status,
            payment_status: BookingPaymentStatus::Unpaid,
            amount_paid_cents: 0,
            deposit_allocated_cents: 0,
            notes: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    pub fn tag(id: i32, name: &str) -> Tag {
        Tag {
            id: TagId::new(id).unwrap(),
            tenant_id: tenant_id(),
            name: TagName::new(name).unwrap(),
            color: "#6b7280".to_string(),
            created_at: now(),
        }
    }
}
