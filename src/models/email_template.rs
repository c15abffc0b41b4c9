use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::email_template::{
    EmailTemplate as DomainEmailTemplate, NewEmailTemplate as DomainNewEmailTemplate,
    UpdateEmailTemplate as DomainUpdateEmailTemplate,
};
use crate::domain::types::{EmailTemplateId, TemplateText, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::email_templates)]
pub struct EmailTemplate {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::email_templates)]
pub struct NewEmailTemplate<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::email_templates)]
pub struct UpdateEmailTemplate<'a> {
    pub name: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<EmailTemplate> for DomainEmailTemplate {
    type Error = TypeConstraintError;

    fn try_from(template: EmailTemplate) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EmailTemplateId::try_from(template.id)?,
            tenant_id: TenantId::try_from(template.tenant_id)?,
            name: TemplateText::new(template.name)?,
            subject: TemplateText::new(template.subject)?,
            body: TemplateText::new(template.body)?,
            created_at: template.created_at,
            updated_at: template.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewEmailTemplate> for NewEmailTemplate<'a> {
    fn from(template: &'a DomainNewEmailTemplate) -> Self {
        Self {
            tenant_id: template.tenant_id.get(),
            name: template.name.as_str(),
            subject: template.subject.as_str(),
            body: template.body.as_str(),
        }
    }
}

impl<'a> From<&'a DomainUpdateEmailTemplate> for UpdateEmailTemplate<'a> {
    fn from(template: &'a DomainUpdateEmailTemplate) -> Self {
        Self {
            name: template.name.as_str(),
            subject: template.subject.as_str(),
            body: template.body.as_str(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
