use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::contact::{
    Contact as DomainContact, NewContact as DomainNewContact,
    UpdateContact as DomainUpdateContact,
};
use crate::domain::types::{
    ContactEmail, ContactId, ContactName, PhoneNumber, TenantId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::contacts)]
/// Diesel model for [`crate::domain::contact::Contact`].
pub struct Contact {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::contacts)]
pub struct NewContact<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub status: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::contacts)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateContact<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub status: &'a str,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::contact_fields)]
pub struct ContactField {
    pub contact_id: i32,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::contact_tags)]
pub struct ContactTag {
    pub contact_id: i32,
    pub tag_id: i32,
}

impl TryFrom<Contact> for DomainContact {
    type Error = TypeConstraintError;

    fn try_from(contact: Contact) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContactId::try_from(contact.id)?,
            tenant_id: TenantId::try_from(contact.tenant_id)?,
            name: ContactName::new(contact.name)?,
            email: ContactEmail::new(contact.email)?,
            phone: contact.phone.map(PhoneNumber::new).transpose()?,
            notes: contact.notes,
            status: contact.status.parse()?,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
            fields: None,
        })
    }
}

impl<'a> From<&'a DomainNewContact> for NewContact<'a> {
    fn from(contact: &'a DomainNewContact) -> Self {
        Self {
            tenant_id: contact.tenant_id.get(),
            name: contact.name.as_str(),
            email: contact.email.as_str(),
            phone: contact.phone.as_ref().map(PhoneNumber::as_str),
            notes: contact.notes.as_deref(),
            status: contact.status.as_str(),
        }
    }
}

impl<'a> From<&'a DomainUpdateContact> for UpdateContact<'a> {
    fn from(contact: &'a DomainUpdateContact) -> Self {
        Self {
            name: contact.name.as_str(),
            email: contact.email.as_str(),
            phone: contact.phone.as_ref().map(PhoneNumber::as_str),
            notes: contact.notes.as_deref(),
            status: contact.status.as_str(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contact::ContactStatus;

    #[test]
    fn row_converts_into_domain() {
        let now = chrono::Utc::now().naive_utc();
        let row = Contact {
            id: 3,
            tenant_id: 1,
            name: "Grace Hopper".to_string(),
            email: "Grace@Example.com".to_string(),
            phone: None,
            notes: Some("prefers mornings".to_string()),
            status: "client".to_string(),
            created_at: now,
            updated_at: now,
        };
        let contact = DomainContact::try_from(row).unwrap();
        assert_eq!(contact.email.as_str(), "grace@example.com");
        assert_eq!(contact.status, ContactStatus::Client);
        assert!(contact.fields.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let now = chrono::Utc::now().naive_utc();
        let row = Contact {
            id: 3,
            tenant_id: 1,
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            phone: None,
            notes: None,
            status: "vip".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(DomainContact::try_from(row).is_err());
    }
}
