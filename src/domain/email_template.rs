use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{EmailTemplateId, TemplateText, TenantId};

/// Reusable email with tera placeholders in the subject and body.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EmailTemplate {
    pub id: EmailTemplateId,
    pub tenant_id: TenantId,
    pub name: TemplateText,
    pub subject: TemplateText,
    pub body: TemplateText,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewEmailTemplate {
    pub tenant_id: TenantId,
    pub name: TemplateText,
    pub subject: TemplateText,
    pub body: TemplateText,
}

#[derive(Clone, Debug)]
pub struct UpdateEmailTemplate {
    pub name: TemplateText,
    pub subject: TemplateText,
    pub body: TemplateText,
}
