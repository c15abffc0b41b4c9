use serde::Deserialize;
use validator::Validate;

use crate::domain::email_template::{NewEmailTemplate, UpdateEmailTemplate};
use crate::domain::types::{ContactEmail, TemplateText, TenantId};
use crate::forms::{FormError, trimmed};

/// Template source is stored verbatim; escaping happens when rendering.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailTemplatePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 50000))]
    pub body: String,
}

impl EmailTemplatePayload {
    pub fn into_new(self, tenant_id: TenantId) -> Result<NewEmailTemplate, FormError> {
        self.validate()?;
        Ok(NewEmailTemplate {
            tenant_id,
            name: TemplateText::new(self.name)?,
            subject: TemplateText::new(self.subject)?,
            body: TemplateText::new(self.body)?,
        })
    }

    pub fn into_update(self) -> Result<UpdateEmailTemplate, FormError> {
        self.validate()?;
        Ok(UpdateEmailTemplate {
            name: TemplateText::new(self.name)?,
            subject: TemplateText::new(self.subject)?,
            body: TemplateText::new(self.body)?,
        })
    }
}

/// Recipient of a test send; defaults to the tenant's own address.
#[derive(Debug, Default, Deserialize)]
pub struct TestEmailPayload {
    pub to: Option<String>,
}

impl TestEmailPayload {
    pub fn recipient(self) -> Result<Option<ContactEmail>, FormError> {
        trimmed(self.to).map(ContactEmail::new).transpose().map_err(Into::into)
    }
}
