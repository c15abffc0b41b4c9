use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{TenantId, WebhookId, WebhookUrl, text_enum};

text_enum!(
    /// Domain events a webhook endpoint may subscribe to.
    WebhookEvent {
        BookingCreated => "booking.created",
        BookingConfirmed => "booking.confirmed",
        BookingCancelled => "booking.cancelled",
        BookingRescheduled => "booking.rescheduled",
        BookingCompleted => "booking.completed",
        ContactCreated => "contact.created",
        ContactUpdated => "contact.updated",
        PaymentReceived => "payment.received",
        PaymentRefunded => "payment.refunded",
        InvoiceCreated => "invoice.created",
        InvoiceSent => "invoice.sent",
        InvoicePaid => "invoice.paid",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Webhook {
    pub id: WebhookId,
    pub tenant_id: TenantId,
    pub url: WebhookUrl,
    pub secret: String,
    pub events: Vec<WebhookEvent>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Webhook {
    pub fn subscribes_to(&self, event: WebhookEvent) -> bool {
        self.active && self.events.contains(&event)
    }
}

#[derive(Clone, Debug)]
pub struct NewWebhook {
    pub tenant_id: TenantId,
    pub url: WebhookUrl,
    pub secret: String,
    pub events: Vec<WebhookEvent>,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub struct UpdateWebhook {
    pub url: WebhookUrl,
    pub events: Vec<WebhookEvent>,
    pub description: Option<String>,
    pub active: bool,
}

/// Log entry describing one delivery of an event to an endpoint.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WebhookDelivery {
    pub id: i32,
    pub webhook_id: WebhookId,
    pub event: String,
    pub payload: String,
    pub response: Option<String>,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempts: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewWebhookDelivery {
    pub webhook_id: WebhookId,
    pub event: String,
    pub payload: String,
    pub response: Option<String>,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempts: i32,
}
