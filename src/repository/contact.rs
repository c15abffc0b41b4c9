use std::collections::HashMap;

use diesel::prelude::*;

use crate::domain::contact::{Contact, ContactStatus, NewContact, UpdateContact};
use crate::domain::tag::Tag;
use crate::domain::types::{ContactEmail, ContactId, TagId, TenantId};
use crate::models::contact::{
    Contact as DbContact, ContactField, ContactTag, NewContact as DbNewContact,
    UpdateContact as DbUpdateContact,
};
use crate::models::tag::Tag as DbTag;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    ContactListQuery, ContactReader, ContactWriter, DieselRepository, count_to_usize,
};
use crate::schema::{contact_fields, contact_tags, contacts, tags};

fn load_fields(
    conn: &mut SqliteConnection,
    contact_id: i32,
) -> QueryResult<HashMap<String, String>> {
    Ok(contact_fields::table
        .filter(contact_fields::contact_id.eq(contact_id))
        .load::<ContactField>(conn)?
        .into_iter()
        .map(|f| (f.field, f.value))
        .collect())
}

fn with_fields(conn: &mut SqliteConnection, row: DbContact) -> RepositoryResult<Contact> {
    let fields = load_fields(conn, row.id)?;
    let mut contact = Contact::try_from(row)?;
    contact.fields = Some(fields);
    Ok(contact)
}

impl ContactReader for DieselRepository {
    fn get_contact_by_id(
        &self,
        id: ContactId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Contact>> {
        let mut conn = self.conn()?;
        let row = contacts::table
            .filter(contacts::id.eq(id.get()))
            .filter(contacts::tenant_id.eq(tenant_id.get()))
            .first::<DbContact>(&mut conn)
            .optional()?;
        row.map(|row| with_fields(&mut conn, row)).transpose()
    }

    fn get_contact_by_email(
        &self,
        email: &ContactEmail,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Contact>> {
        let mut conn = self.conn()?;
        let row = contacts::table
            .filter(contacts::email.eq(email.as_str()))
            .filter(contacts::tenant_id.eq(tenant_id.get()))
            .first::<DbContact>(&mut conn)
            .optional()?;
        row.map(|row| with_fields(&mut conn, row)).transpose()
    }

    fn list_contacts(&self, query: ContactListQuery) -> RepositoryResult<(usize, Vec<Contact>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = contacts::table
                .filter(contacts::tenant_id.eq(query.tenant_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                let pattern = format!("%{term}%");
                items = items.filter(
                    contacts::name
                        .like(pattern.clone())
                        .or(contacts::email.like(pattern.clone()))
                        .or(contacts::phone.like(pattern)),
                );
            }
            if let Some(status) = query.status {
                items = items.filter(contacts::status.eq(status.as_str()));
            }
            if let Some(tag_id) = query.tag_id {
                let tagged = contact_tags::table
                    .filter(contact_tags::tag_id.eq(tag_id.get()))
                    .select(contact_tags::contact_id);
                items = items.filter(contacts::id.eq_any(tagged));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)?;

        let mut items = query_builder()
            .order(contacts::created_at.desc())
            .then_order_by(contacts::id.desc());
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let contacts = items
            .load::<DbContact>(&mut conn)?
            .into_iter()
            .map(Contact::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((count_to_usize(total), contacts))
    }

    fn list_contact_tags(&self, contact_id: ContactId) -> RepositoryResult<Vec<Tag>> {
        let mut conn = self.conn()?;
        let rows = tags::table
            .inner_join(contact_tags::table)
            .filter(contact_tags::contact_id.eq(contact_id.get()))
            .select(DbTag::as_select())
            .order(tags::name.asc())
            .load::<DbTag>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Tag::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ContactWriter for DieselRepository {
    fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact> {
        let mut conn = self.conn()?;
        let insertable: DbNewContact = new_contact.into();
        let created = diesel::insert_into(contacts::table)
            .values(&insertable)
            .get_result::<DbContact>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn import_contacts(&self, new_contacts: &[NewContact]) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let insertables: Vec<DbNewContact> = new_contacts.iter().map(Into::into).collect();
        let inserted = diesel::insert_or_ignore_into(contacts::table)
            .values(&insertables)
            .execute(&mut conn)?;
        Ok(inserted)
    }

    fn update_contact(
        &self,
        id: ContactId,
        tenant_id: TenantId,
        updates: &UpdateContact,
    ) -> RepositoryResult<Contact> {
        let mut conn = self.conn()?;
        let changes: DbUpdateContact = updates.into();
        let updated = diesel::update(
            contacts::table
                .filter(contacts::id.eq(id.get()))
                .filter(contacts::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbContact>(&mut conn)?;
        with_fields(&mut conn, updated)
    }

    fn delete_contact(&self, id: ContactId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            contacts::table
                .filter(contacts::id.eq(id.get()))
                .filter(contacts::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn replace_contact_fields(
        &self,
        id: ContactId,
        fields: &HashMap<String, String>,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let rows: Vec<ContactField> = fields
            .iter()
            .filter(|(field, _)| !field.trim().is_empty())
            .map(|(field, value)| ContactField {
                contact_id: id.get(),
                field: field.trim().to_string(),
                value: value.clone(),
            })
            .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(contact_fields::table.filter(contact_fields::contact_id.eq(id.get())))
                .execute(conn)?;
            if !rows.is_empty() {
                diesel::insert_into(contact_fields::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn add_contact_tag(&self, contact_id: ContactId, tag_id: TagId) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(contact_tags::table)
            .values(ContactTag {
                contact_id: contact_id.get(),
                tag_id: tag_id.get(),
            })
            .execute(&mut conn)?;
        Ok(inserted > 0)
    }

    fn remove_contact_tag(&self, contact_id: ContactId, tag_id: TagId) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            contact_tags::table
                .filter(contact_tags::contact_id.eq(contact_id.get()))
                .filter(contact_tags::tag_id.eq(tag_id.get())),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn assign_contact_status(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
        status: ContactStatus,
    ) -> RepositoryResult<Option<TagId>> {
        let mut conn = self.conn()?;
        let status_names: Vec<String> = ContactStatus::ALL
            .iter()
            .map(|s| s.tag_name().to_lowercase())
            .collect();

        let tag_id = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let status_tags: Vec<(i32, String)> = tags::table
                .filter(tags::tenant_id.eq(tenant_id.get()))
                .select((tags::id, tags::name))
                .load::<(i32, String)>(conn)?
                .into_iter()
                .filter(|(_, name)| status_names.contains(&name.to_lowercase()))
                .collect();

            let target = status_tags
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(status.tag_name()))
                .map(|(id, _)| *id);
            let others: Vec<i32> = status_tags
                .iter()
                .map(|(id, _)| *id)
                .filter(|id| Some(*id) != target)
                .collect();

            diesel::delete(
                contact_tags::table
                    .filter(contact_tags::contact_id.eq(contact_id.get()))
                    .filter(contact_tags::tag_id.eq_any(&others)),
            )
            .execute(conn)?;

            if let Some(tag_id) = target {
                diesel::insert_or_ignore_into(contact_tags::table)
                    .values(ContactTag {
                        contact_id: contact_id.get(),
                        tag_id,
                    })
                    .execute(conn)?;
            }

            diesel::update(
                contacts::table
                    .filter(contacts::id.eq(contact_id.get()))
                    .filter(contacts::tenant_id.eq(tenant_id.get())),
            )
            .set((
                contacts::status.eq(status.as_str()),
                contacts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)?;

            Ok(target)
        })?;

        Ok(tag_id.map(TagId::try_from).transpose()?)
    }
}
