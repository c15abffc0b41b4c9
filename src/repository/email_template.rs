use diesel::prelude::*;

use crate::domain::email_template::{EmailTemplate, NewEmailTemplate, UpdateEmailTemplate};
use crate::domain::types::{EmailTemplateId, TenantId};
use crate::models::email_template::{
    EmailTemplate as DbEmailTemplate, NewEmailTemplate as DbNewEmailTemplate,
    UpdateEmailTemplate as DbUpdateEmailTemplate,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, EmailTemplateReader, EmailTemplateWriter};
use crate::schema::email_templates;

impl EmailTemplateReader for DieselRepository {
    fn get_email_template_by_id(
        &self,
        id: EmailTemplateId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<EmailTemplate>> {
        let mut conn = self.conn()?;
        let row = email_templates::table
            .filter(email_templates::id.eq(id.get()))
            .filter(email_templates::tenant_id.eq(tenant_id.get()))
            .first::<DbEmailTemplate>(&mut conn)
            .optional()?;
        Ok(row.map(EmailTemplate::try_from).transpose()?)
    }

    fn list_email_templates(&self, tenant_id: TenantId) -> RepositoryResult<Vec<EmailTemplate>> {
        let mut conn = self.conn()?;
        let rows = email_templates::table
            .filter(email_templates::tenant_id.eq(tenant_id.get()))
            .order(email_templates::name.asc())
            .load::<DbEmailTemplate>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(EmailTemplate::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl EmailTemplateWriter for DieselRepository {
    fn create_email_template(
        &self,
        new_template: &NewEmailTemplate,
    ) -> RepositoryResult<EmailTemplate> {
        let mut conn = self.conn()?;
        let insertable: DbNewEmailTemplate = new_template.into();
        let created = diesel::insert_into(email_templates::table)
            .values(&insertable)
            .get_result::<DbEmailTemplate>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn update_email_template(
        &self,
        id: EmailTemplateId,
        tenant_id: TenantId,
        updates: &UpdateEmailTemplate,
    ) -> RepositoryResult<EmailTemplate> {
        let mut conn = self.conn()?;
        let changes: DbUpdateEmailTemplate = updates.into();
        let updated = diesel::update(
            email_templates::table
                .filter(email_templates::id.eq(id.get()))
                .filter(email_templates::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbEmailTemplate>(&mut conn)?;
        Ok(updated.try_into()?)
    }

    fn delete_email_template(
        &self,
        id: EmailTemplateId,
        tenant_id: TenantId,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            email_templates::table
                .filter(email_templates::id.eq(id.get()))
                .filter(email_templates::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
