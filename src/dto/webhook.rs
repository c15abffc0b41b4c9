use serde::Serialize;

use crate::domain::webhook::{Webhook, WebhookDelivery};

#[derive(Debug, Serialize)]
pub struct WebhookDetail {
    #[serde(flatten)]
    pub webhook: Webhook,
    pub recent_deliveries: Vec<WebhookDelivery>,
}
