use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{TenantId, WebhookId, WebhookUrl};
use crate::domain::webhook::{
    NewWebhook as DomainNewWebhook, NewWebhookDelivery as DomainNewDelivery,
    UpdateWebhook as DomainUpdateWebhook, Webhook as DomainWebhook, WebhookDelivery,
    WebhookEvent,
};
use crate::repository::errors::RepositoryError;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::webhooks)]
/// Diesel model for [`crate::domain::webhook::Webhook`]. `events` holds a
/// JSON array of event names.
pub struct Webhook {
    pub id: i32,
    pub tenant_id: i32,
    pub url: String,
    pub secret: String,
    pub events: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::webhooks)]
pub struct NewWebhook<'a> {
    pub tenant_id: i32,
    pub url: &'a str,
    pub secret: &'a str,
    pub events: String,
    pub description: Option<&'a str>,
    pub active: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::webhooks)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateWebhook<'a> {
    pub url: &'a str,
    pub events: String,
    pub description: Option<&'a str>,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::webhook_deliveries)]
pub struct Delivery {
    pub id: i32,
    pub webhook_id: i32,
    pub event: String,
    pub payload: String,
    pub response: Option<String>,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempts: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::webhook_deliveries)]
pub struct NewDelivery<'a> {
    pub webhook_id: i32,
    pub event: &'a str,
    pub payload: &'a str,
    pub response: Option<&'a str>,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempts: i32,
}

fn encode_events(events: &[WebhookEvent]) -> Result<String, RepositoryError> {
    Ok(serde_json::to_string(events)?)
}

impl TryFrom<Webhook> for DomainWebhook {
    type Error = RepositoryError;

    fn try_from(webhook: Webhook) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WebhookId::try_from(webhook.id)?,
            tenant_id: TenantId::try_from(webhook.tenant_id)?,
            url: WebhookUrl::new(webhook.url)?,
            secret: webhook.secret,
            events: serde_json::from_str(&webhook.events)?,
            description: webhook.description,
            active: webhook.active,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewWebhook> for NewWebhook<'a> {
    type Error = RepositoryError;

    fn try_from(webhook: &'a DomainNewWebhook) -> Result<Self, Self::Error> {
        Ok(Self {
            tenant_id: webhook.tenant_id.get(),
            url: webhook.url.as_str(),
            secret: &webhook.secret,
            events: encode_events(&webhook.events)?,
            description: webhook.description.as_deref(),
            active: webhook.active,
        })
    }
}

impl<'a> TryFrom<&'a DomainUpdateWebhook> for UpdateWebhook<'a> {
    type Error = RepositoryError;

    fn try_from(webhook: &'a DomainUpdateWebhook) -> Result<Self, Self::Error> {
        Ok(Self {
            url: webhook.url.as_str(),
            events: encode_events(&webhook.events)?,
            description: webhook.description.as_deref(),
            active: webhook.active,
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }
}

impl TryFrom<Delivery> for WebhookDelivery {
    type Error = RepositoryError;

    fn try_from(delivery: Delivery) -> Result<Self, Self::Error> {
        Ok(Self {
            id: delivery.id,
            webhook_id: WebhookId::try_from(delivery.webhook_id)?,
            event: delivery.event,
            payload: delivery.payload,
            response: delivery.response,
            status_code: delivery.status_code,
            success: delivery.success,
            attempts: delivery.attempts,
            created_at: delivery.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewDelivery> for NewDelivery<'a> {
    fn from(delivery: &'a DomainNewDelivery) -> Self {
        Self {
            webhook_id: delivery.webhook_id.get(),
            event: &delivery.event,
            payload: &delivery.payload,
            response: delivery.response.as_deref(),
            status_code: delivery.status_code,
            success: delivery.success,
            attempts: delivery.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_stored_as_json_names() {
        let encoded =
            encode_events(&[WebhookEvent::BookingCreated, WebhookEvent::InvoicePaid]).unwrap();
        assert_eq!(encoded, r#"["booking.created","invoice.paid"]"#);
    }
}
