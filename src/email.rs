//! Outbound email: template rendering and delivery.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tera::{Context, Tera};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::domain::booking::Booking;
use crate::domain::contact::Contact;
use crate::domain::email_template::EmailTemplate;
use crate::domain::invoice::Invoice;
use crate::domain::tenant::Tenant;
use crate::formatters::{
    format_currency, format_duration, format_long_date, format_month_day_year, format_time,
};
use crate::models::config::ServerConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("email queue is closed")]
    QueueClosed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Queues an email for delivery.
pub trait EmailSender: Send + Sync {
    fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Posts emails as JSON to a transactional email HTTP API from a background
/// task.
pub struct HttpEmailSender {
    sender: UnboundedSender<OutgoingEmail>,
}

impl HttpEmailSender {
    /// Must be started from within a tokio runtime.
    pub fn start(api_url: String, api_key: String, from: String) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        let (sender, mut receiver) = unbounded_channel::<OutgoingEmail>();

        tokio::spawn(async move {
            while let Some(email) = receiver.recv().await {
                let body = json!({
                    "from": from,
                    "to": [email.to],
                    "subject": email.subject,
                    "html": email.html,
                });
                let result = client
                    .post(&api_url)
                    .bearer_auth(&api_key)
                    .json(&body)
                    .send()
                    .await;
                match result {
                    Ok(resp) if resp.status().is_success() => {
                        log::info!("Sent email \"{}\" to {}", email.subject, email.to);
                    }
                    Ok(resp) => {
                        let status = resp.status();
                        let text = resp.text().await.unwrap_or_default();
                        log::error!(
                            "Email provider rejected mail to {}: {status} {text}",
                            email.to
                        );
                    }
                    Err(e) => log::error!("Failed to send email to {}: {e}", email.to),
                }
            }
            log::info!("Email worker stopped");
        });

        Ok(Self { sender })
    }
}

impl EmailSender for HttpEmailSender {
    fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sender
            .send(email)
            .map_err(|_| EmailError::QueueClosed)
    }
}

/// Writes emails to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        log::info!(
            "Email delivery disabled; would send \"{}\" to {}",
            email.subject,
            email.to
        );
        Ok(())
    }
}

/// HTTP sender when a provider is configured, otherwise [`LogEmailSender`].
pub fn sender_from_config(config: &ServerConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    match (&config.email_api_url, &config.email_api_key) {
        (Some(url), Some(key)) => Ok(Arc::new(HttpEmailSender::start(
            url.clone(),
            key.clone(),
            config.email_from.clone(),
        )?)),
        _ => {
            log::info!("No email provider configured, emails will only be logged");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ClientVariables {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BookingVariables {
    pub service: String,
    pub date: String,
    pub time: String,
    pub duration: String,
    pub price: String,
    pub confirmation_number: String,
    pub status: String,
    pub notes: String,
    pub reschedule_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BusinessVariables {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct InvoiceVariables {
    pub number: String,
    pub amount: String,
    pub balance: String,
    pub due_date: String,
    pub paid_date: String,
}

/// Values available to email templates as `{{ client.first_name }}`,
/// `{{ booking.date }}` and so on. Sections that were not filled render as
/// empty strings.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TemplateVariables {
    pub client: ClientVariables,
    pub booking: BookingVariables,
    pub business: BusinessVariables,
    pub invoice: InvoiceVariables,
}

impl TemplateVariables {
    pub fn for_tenant(tenant: &Tenant) -> Self {
        Self {
            business: BusinessVariables {
                name: tenant.name.to_string(),
                email: tenant.email.clone(),
                phone: tenant.business_phone.clone().unwrap_or_default(),
                address: tenant.business_address.clone().unwrap_or_default(),
            },
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, contact: &Contact) -> Self {
        self.client = ClientVariables {
            name: contact.name.to_string(),
            first_name: contact.first_name().to_string(),
            last_name: contact.last_name(),
            email: contact.email.to_string(),
            phone: contact
                .phone
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default(),
        };
        self
    }

    /// Adds booking details; self-service links point at `app_url`.
    pub fn with_booking(
        mut self,
        booking: &Booking,
        service_name: &str,
        app_url: &str,
        tenant_slug: &str,
    ) -> Self {
        let base = app_url.trim_end_matches('/');
        self.booking = BookingVariables {
            service: service_name.to_string(),
            date: format_long_date(booking.scheduled_at.date()),
            time: format_time(booking.scheduled_at.time()),
            duration: format_duration(booking.duration_minutes),
            price: format_currency(i64::from(booking.total_price_cents)),
            confirmation_number: booking.public_id.confirmation_number(),
            status: booking.status.to_string(),
            notes: booking.notes.clone().unwrap_or_default(),
            reschedule_url: format!(
                "{base}/{tenant_slug}/booking/reschedule/{}",
                booking.public_id
            ),
            cancel_url: format!("{base}/{tenant_slug}/booking/cancel/{}", booking.public_id),
        };
        self
    }

    pub fn with_invoice(mut self, invoice: &Invoice) -> Self {
        self.invoice = InvoiceVariables {
            number: invoice.invoice_number.clone(),
            amount: format_currency(i64::from(invoice.total_cents)),
            balance: format_currency(i64::from(invoice.balance_due_cents())),
            due_date: format_month_day_year(invoice.due_date),
            paid_date: invoice
                .paid_at
                .map(|at| format_month_day_year(at.date()))
                .unwrap_or_default(),
        };
        if self.client.name.is_empty() {
            self.client.name = invoice.contact_name.clone();
            self.client.first_name = invoice
                .contact_name
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            self.client.email = invoice.contact_email.clone();
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Renders a subject and HTML body. Substituted values are HTML-escaped in
/// the body only.
pub fn render_template(
    subject: &str,
    body: &str,
    variables: &TemplateVariables,
) -> Result<RenderedEmail, EmailError> {
    let context = Context::from_serialize(variables)?;
    Ok(RenderedEmail {
        subject: Tera::one_off(subject, &context, false)?,
        html: Tera::one_off(body, &context, true)?,
    })
}

/// Built-in template used when the tenant has not defined one of that name.
pub struct DefaultTemplate {
    pub name: &'static str,
    pub subject: &'static str,
    pub body: &'static str,
}

pub const BOOKING_CONFIRMATION: DefaultTemplate = DefaultTemplate {
    name: "Booking Confirmation",
    subject: "Your booking with {{ business.name }} is confirmed",
    body: "<p>Hi {{ client.first_name }},</p>\
<p>Your {{ booking.service }} on {{ booking.date }} at {{ booking.time }} \
({{ booking.duration }}) is confirmed.</p>\
<p>Confirmation number: <strong>{{ booking.confirmation_number }}</strong></p>\
<p><a href=\"{{ booking.reschedule_url }}\">Reschedule</a> | \
<a href=\"{{ booking.cancel_url }}\">Cancel</a></p>\
<p>{{ business.name }}</p>",
};

pub const BOOKING_REMINDER: DefaultTemplate = DefaultTemplate {
    name: "Booking Reminder",
    subject: "Reminder: {{ booking.service }} tomorrow at {{ booking.time }}",
    body: "<p>Hi {{ client.first_name }},</p>\
<p>This is a reminder of your {{ booking.service }} on {{ booking.date }} at \
{{ booking.time }} ({{ booking.duration }}).</p>\
<p>Need to change plans? <a href=\"{{ booking.reschedule_url }}\">Reschedule</a> or \
<a href=\"{{ booking.cancel_url }}\">cancel</a>.</p>\
<p>{{ business.name }}<br>{{ business.address }}<br>{{ business.phone }}</p>",
};

pub const BOOKING_CANCELLED: DefaultTemplate = DefaultTemplate {
    name: "Booking Cancelled",
    subject: "Your booking with {{ business.name }} was cancelled",
    body: "<p>Hi {{ client.first_name }},</p>\
<p>Your {{ booking.service }} on {{ booking.date }} at {{ booking.time }} has been \
cancelled.</p>\
<p>{{ business.name }}</p>",
};

pub const INVOICE_SENT: DefaultTemplate = DefaultTemplate {
    name: "Invoice",
    subject: "Invoice {{ invoice.number }} from {{ business.name }}",
    body: "<p>Hi {{ client.first_name }},</p>\
<p>Invoice {{ invoice.number }} for {{ invoice.amount }} is due on \
{{ invoice.due_date }}. Balance due: {{ invoice.balance }}.</p>\
<p>{{ business.name }}</p>",
};

/// Templates created by the seed operation.
pub const SEED_TEMPLATES: [&DefaultTemplate; 3] =
    [&BOOKING_CONFIRMATION, &BOOKING_REMINDER, &BOOKING_CANCELLED];

/// The tenant's template named like `fallback`, ignoring case, or `fallback`.
pub fn pick_template<'a>(
    templates: &'a [EmailTemplate],
    fallback: &'a DefaultTemplate,
) -> (&'a str, &'a str) {
    templates
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(fallback.name))
        .map(|t| (t.subject.as_str(), t.body.as_str()))
        .unwrap_or((fallback.subject, fallback.body))
}
