use diesel::prelude::*;

use crate::domain::types::{TenantId, WebhookId};
use crate::domain::webhook::{
    NewWebhook, NewWebhookDelivery, UpdateWebhook, Webhook, WebhookDelivery, WebhookEvent,
};
use crate::models::webhook::{
    Delivery as DbDelivery, NewDelivery as DbNewDelivery, NewWebhook as DbNewWebhook,
    UpdateWebhook as DbUpdateWebhook, Webhook as DbWebhook,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, WebhookReader, WebhookWriter};
use crate::schema::{webhook_deliveries, webhooks};

impl WebhookReader for DieselRepository {
    fn get_webhook_by_id(
        &self,
        id: WebhookId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Webhook>> {
        let mut conn = self.conn()?;
        let row = webhooks::table
            .filter(webhooks::id.eq(id.get()))
            .filter(webhooks::tenant_id.eq(tenant_id.get()))
            .first::<DbWebhook>(&mut conn)
            .optional()?;
        row.map(Webhook::try_from).transpose()
    }

    fn list_webhooks(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Webhook>> {
        let mut conn = self.conn()?;
        webhooks::table
            .filter(webhooks::tenant_id.eq(tenant_id.get()))
            .order(webhooks::created_at.desc())
            .load::<DbWebhook>(&mut conn)?
            .into_iter()
            .map(Webhook::try_from)
            .collect()
    }

    fn list_subscribed_webhooks(
        &self,
        tenant_id: TenantId,
        event: WebhookEvent,
    ) -> RepositoryResult<Vec<Webhook>> {
        let mut conn = self.conn()?;
        let rows = webhooks::table
            .filter(webhooks::tenant_id.eq(tenant_id.get()))
            .filter(webhooks::active.eq(true))
            .load::<DbWebhook>(&mut conn)?;
        // Subscriptions are a JSON array, so matching happens after decoding.
        let mut subscribed = Vec::new();
        for row in rows {
            let webhook = Webhook::try_from(row)?;
            if webhook.subscribes_to(event) {
                subscribed.push(webhook);
            }
        }
        Ok(subscribed)
    }

    fn list_webhook_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: i64,
    ) -> RepositoryResult<Vec<WebhookDelivery>> {
        let mut conn = self.conn()?;
        webhook_deliveries::table
            .filter(webhook_deliveries::webhook_id.eq(webhook_id.get()))
            .order(webhook_deliveries::id.desc())
            .limit(limit)
            .load::<DbDelivery>(&mut conn)?
            .into_iter()
            .map(WebhookDelivery::try_from)
            .collect()
    }
}

impl WebhookWriter for DieselRepository {
    fn create_webhook(&self, new_webhook: &NewWebhook) -> RepositoryResult<Webhook> {
        let mut conn = self.conn()?;
        let insertable = DbNewWebhook::try_from(new_webhook)?;
        let created = diesel::insert_into(webhooks::table)
            .values(&insertable)
            .get_result::<DbWebhook>(&mut conn)?;
        created.try_into()
    }

    fn update_webhook(
        &self,
        id: WebhookId,
        tenant_id: TenantId,
        updates: &UpdateWebhook,
    ) -> RepositoryResult<Webhook> {
        let mut conn = self.conn()?;
        let changes = DbUpdateWebhook::try_from(updates)?;
        let updated = diesel::update(
            webhooks::table
                .filter(webhooks::id.eq(id.get()))
                .filter(webhooks::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbWebhook>(&mut conn)?;
        updated.try_into()
    }

    fn delete_webhook(&self, id: WebhookId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            webhooks::table
                .filter(webhooks::id.eq(id.get()))
                .filter(webhooks::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn create_webhook_delivery(
        &self,
        delivery: &NewWebhookDelivery,
    ) -> RepositoryResult<WebhookDelivery> {
        let mut conn = self.conn()?;
        let insertable: DbNewDelivery = delivery.into();
        let created = diesel::insert_into(webhook_deliveries::table)
            .values(&insertable)
            .get_result::<DbDelivery>(&mut conn)?;
        created.try_into()
    }
}
