use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{
    ContactEmail, ContactId, ContactName, PhoneNumber, TenantId, text_enum,
};

text_enum!(
    /// Lifecycle stage of a contact.
    ContactStatus {
        Lead => "lead",
        Client => "client",
        Inactive => "inactive",
    }
);

impl ContactStatus {
    /// Display name of the status tag mirroring this status.
    pub const fn tag_name(self) -> &'static str {
        match self {
            ContactStatus::Lead => "Lead",
            ContactStatus::Client => "Client",
            ContactStatus::Inactive => "Inactive",
        }
    }

    /// Maps a tag label onto a status, ignoring case.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.tag_name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub tenant_id: TenantId,
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: Option<PhoneNumber>,
    pub notes: Option<String>,
    pub status: ContactStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Custom key/value fields, loaded on demand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<HashMap<String, String>>,
}

impl Contact {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }

    pub fn last_name(&self) -> String {
        self.name.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
    }
}

#[derive(Clone, Debug)]
pub struct NewContact {
    pub tenant_id: TenantId,
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: Option<PhoneNumber>,
    pub notes: Option<String>,
    pub status: ContactStatus,
}

#[derive(Clone, Debug)]
pub struct UpdateContact {
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: Option<PhoneNumber>,
    pub notes: Option<String>,
    pub status: ContactStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_match_case_insensitively() {
        assert_eq!(
            ContactStatus::from_tag_name(" client "),
            Some(ContactStatus::Client)
        );
        assert_eq!(ContactStatus::from_tag_name("VIP"), None);
    }

    #[test]
    fn splits_first_and_last_name() {
        let now = chrono::Utc::now().naive_utc();
        let contact = Contact {
            id: ContactId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            name: ContactName::new("Ada King Lovelace").unwrap(),
            email: ContactEmail::new("ada@example.com").unwrap(),
            phone: None,
            notes: None,
            status: ContactStatus::Lead,
            created_at: now,
            updated_at: now,
            fields: None,
        };
        assert_eq!(contact.first_name(), "Ada");
        assert_eq!(contact.last_name(), "King Lovelace");
    }
}
