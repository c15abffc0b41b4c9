//! Outbound webhook endpoints and their delivery log.

use crate::domain::types::{TenantId, WebhookId};
use crate::domain::webhook::{Webhook, WebhookDelivery};
use crate::dto::webhook::WebhookDetail;
use crate::forms::webhook::WebhookPayload;
use crate::repository::{WebhookReader, WebhookWriter};
use crate::services::{ServiceError, ServiceResult};
use crate::webhooks::generate_webhook_secret;

/// Deliveries shown with an endpoint.
const RECENT_DELIVERIES: i64 = 20;
/// Upper bound of the delivery log listing.
const DELIVERY_LOG_LIMIT: i64 = 100;

fn load_webhook<R>(repo: &R, tenant_id: TenantId, id: WebhookId) -> ServiceResult<Webhook>
where
    R: WebhookReader + ?Sized,
{
    repo.get_webhook_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Webhook"))
}

pub fn list_webhooks<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<Webhook>>
where
    R: WebhookReader + ?Sized,
{
    Ok(repo.list_webhooks(tenant_id)?)
}

pub fn get_webhook<R>(repo: &R, tenant_id: TenantId, id: WebhookId) -> ServiceResult<WebhookDetail>
where
    R: WebhookReader + ?Sized,
{
    let webhook = load_webhook(repo, tenant_id, id)?;
    let recent_deliveries = repo.list_webhook_deliveries(webhook.id, RECENT_DELIVERIES)?;
    Ok(WebhookDetail {
        webhook,
        recent_deliveries,
    })
}

/// Registers an endpoint. The signing secret is generated here and returned
/// with the endpoint.
pub fn create_webhook<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: WebhookPayload,
) -> ServiceResult<Webhook>
where
    R: WebhookWriter + ?Sized,
{
    let new_webhook = payload.into_new(tenant_id, generate_webhook_secret())?;
    let webhook = repo.create_webhook(&new_webhook).map_err(|err| {
        log::error!("Failed to create webhook for tenant {tenant_id}: {err}");
        err
    })?;
    log::info!("Webhook {} registered for {}", webhook.id, webhook.url);
    Ok(webhook)
}

pub fn update_webhook<R>(
    repo: &R,
    tenant_id: TenantId,
    id: WebhookId,
    payload: WebhookPayload,
) -> ServiceResult<Webhook>
where
    R: WebhookReader + WebhookWriter + ?Sized,
{
    load_webhook(repo, tenant_id, id)?;
    let updates = payload.into_update()?;
    Ok(repo.update_webhook(id, tenant_id, &updates)?)
}

pub fn delete_webhook<R>(repo: &R, tenant_id: TenantId, id: WebhookId) -> ServiceResult<()>
where
    R: WebhookReader + WebhookWriter + ?Sized,
{
    load_webhook(repo, tenant_id, id)?;
    Ok(repo.delete_webhook(id, tenant_id)?)
}

pub fn list_deliveries<R>(
    repo: &R,
    tenant_id: TenantId,
    id: WebhookId,
) -> ServiceResult<Vec<WebhookDelivery>>
where
    R: WebhookReader + ?Sized,
{
    let webhook = load_webhook(repo, tenant_id, id)?;
    Ok(repo.list_webhook_deliveries(webhook.id, DELIVERY_LOG_LIMIT)?)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::types::WebhookUrl;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{now, tenant_id};

    #[test]
    fn new_endpoints_get_a_signing_secret() {
        let mut repo = MockRepository::new();
        repo.expect_create_webhook()
            .withf(|new| new.secret.starts_with("whsec_") && new.secret.len() == 70)
            .times(1)
            .returning(|new| {
                Ok(Webhook {
                    id: WebhookId::new(1).unwrap(),
                    tenant_id: new.tenant_id,
                    url: new.url.clone(),
                    secret: new.secret.clone(),
                    events: new.events.clone(),
                    description: None,
                    active: true,
                    created_at: now(),
                    updated_at: now(),
                })
            });
        let payload: WebhookPayload = serde_json::from_value(json!({
            "url": "https://hooks.example.com/bookflow",
            "events": ["booking.created"]
        }))
        .unwrap();

        let webhook = create_webhook(&repo, tenant_id(), payload).unwrap();
        assert_eq!(webhook.url, WebhookUrl::new("https://hooks.example.com/bookflow").unwrap());
    }

    #[test]
    fn deliveries_of_foreign_endpoints_are_hidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_webhook_by_id().returning(|_, _| Ok(None));
        repo.expect_list_webhook_deliveries().times(0);

        let result = list_deliveries(&repo, tenant_id(), WebhookId::new(5).unwrap());
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
