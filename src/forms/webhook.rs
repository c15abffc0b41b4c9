use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{TenantId, WebhookUrl};
use crate::domain::webhook::{NewWebhook, UpdateWebhook, WebhookEvent};
use crate::forms::{FormError, clean_text};

#[derive(Debug, Deserialize, Validate)]
pub struct WebhookPayload {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, message = "subscribe to at least one event"))]
    pub events: Vec<WebhookEvent>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl WebhookPayload {
    fn checked(self) -> Result<(WebhookUrl, Vec<WebhookEvent>, Option<String>, bool), FormError> {
        self.validate()?;
        let url = WebhookUrl::new(self.url)?;
        if !url.as_str().starts_with("https://") && !url.as_str().starts_with("http://") {
            return Err(FormError::Invalid(
                "webhook url must use http or https".to_string(),
            ));
        }
        let mut events = Vec::with_capacity(self.events.len());
        for event in self.events {
            if !events.contains(&event) {
                events.push(event);
            }
        }
        Ok((
            url,
            events,
            clean_text(self.description),
            self.active.unwrap_or(true),
        ))
    }

    /// Builds a new endpoint with the freshly generated signing `secret`.
    pub fn into_new(self, tenant_id: TenantId, secret: String) -> Result<NewWebhook, FormError> {
        let (url, events, description, active) = self.checked()?;
        Ok(NewWebhook {
            tenant_id,
            url,
            secret,
            events,
            description,
            active,
        })
    }

    pub fn into_update(self) -> Result<UpdateWebhook, FormError> {
        let (url, events, description, active) = self.checked()?;
        Ok(UpdateWebhook {
            url,
            events,
            description,
            active,
        })
    }
}
