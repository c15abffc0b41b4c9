use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::contact::{ContactStatus, NewContact, UpdateContact};
use crate::domain::types::{ContactEmail, ContactName, PhoneNumber, TenantId};
use crate::forms::{FormError, clean_text, trimmed};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Checked and lower-cased by [`ContactEmail`].
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub status: Option<ContactStatus>,
}

fn parse_phone(phone: Option<String>) -> Result<Option<PhoneNumber>, FormError> {
    trimmed(phone).map(PhoneNumber::new).transpose().map_err(Into::into)
}

impl ContactPayload {
    pub fn into_new(self, tenant_id: TenantId) -> Result<NewContact, FormError> {
        self.validate()?;
        Ok(NewContact {
            tenant_id,
            name: ContactName::new(self.name)?,
            email: ContactEmail::new(self.email)?,
            phone: parse_phone(self.phone)?,
            notes: clean_text(self.notes),
            status: self.status.unwrap_or(ContactStatus::Lead),
        })
    }

    /// Full replacement; an absent status keeps `current_status`.
    pub fn into_update(self, current_status: ContactStatus) -> Result<UpdateContact, FormError> {
        self.validate()?;
        Ok(UpdateContact {
            name: ContactName::new(self.name)?,
            email: ContactEmail::new(self.email)?,
            phone: parse_phone(self.phone)?,
            notes: clean_text(self.notes),
            status: self.status.unwrap_or(current_status),
        })
    }
}

/// Replacement set of custom fields. Empty values remove the field.
#[derive(Debug, Deserialize)]
pub struct ContactFieldsPayload {
    pub fields: HashMap<String, String>,
}

impl ContactFieldsPayload {
    pub fn into_fields(self) -> Result<HashMap<String, String>, FormError> {
        let mut fields = HashMap::with_capacity(self.fields.len());
        for (key, value) in self.fields {
            let key = key.trim();
            let value = ammonia::clean(value.trim());
            if key.is_empty() {
                return Err(FormError::Invalid("field names cannot be empty".to_string()));
            }
            if key.chars().count() > 100 {
                return Err(FormError::Invalid(format!("field name `{key}` is too long")));
            }
            if !value.is_empty() {
                fields.insert(key.to_string(), value);
            }
        }
        Ok(fields)
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactTagPayload {
    pub tag_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactListParams {
    pub search: Option<String>,
    pub tag_id: Option<i32>,
    pub status: Option<ContactStatus>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Row that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRowError {
    /// 1-based data row number, not counting the header.
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub contacts: Vec<NewContact>,
    pub errors: Vec<ImportRowError>,
    /// Rows repeating an email seen earlier in the file.
    pub duplicates: usize,
}

#[derive(Debug, Deserialize)]
struct CsvContactRow {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    status: Option<String>,
}

fn row_to_contact(tenant_id: TenantId, row: CsvContactRow) -> Result<NewContact, FormError> {
    let name = trimmed(row.name)
        .ok_or_else(|| FormError::Invalid("missing required field `name`".to_string()))?;
    let email = trimmed(row.email)
        .ok_or_else(|| FormError::Invalid("missing required field `email`".to_string()))?;
    let status = match trimmed(row.status) {
        Some(status) => status.to_lowercase().parse()?,
        None => ContactStatus::Lead,
    };
    Ok(NewContact {
        tenant_id,
        name: ContactName::new(name)?,
        email: ContactEmail::new(email)?,
        phone: parse_phone(row.phone)?,
        notes: clean_text(row.notes),
        status,
    })
}

/// Parses a CSV export with a header row. Recognised columns are `name`,
/// `email`, `phone`, `notes` and `status` in any order and case; others are
/// ignored.
pub fn parse_contacts_csv(tenant_id: TenantId, data: &str) -> Result<ParsedImport, FormError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FormError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<csv::StringRecord>();
    if !headers.iter().any(|h| h == "email") || !headers.iter().any(|h| h == "name") {
        return Err(FormError::Csv(
            "header row must contain `name` and `email` columns".to_string(),
        ));
    }

    let mut parsed = ParsedImport::default();
    let mut seen = HashSet::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let result = record
            .and_then(|record| record.deserialize::<CsvContactRow>(Some(&headers)))
            .map_err(|e| FormError::Csv(e.to_string()))
            .and_then(|r| row_to_contact(tenant_id, r));
        match result {
            Ok(contact) => {
                if seen.insert(contact.email.clone()) {
                    parsed.contacts.push(contact);
                } else {
                    parsed.duplicates += 1;
                }
            }
            Err(e) => parsed.errors.push(ImportRowError {
                row,
                error: e.to_string(),
            }),
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TypeConstraintError;

    fn tenant() -> TenantId {
        TenantId::new(1).unwrap()
    }

    #[test]
    fn csv_rows_are_parsed_and_deduplicated() {
        let data = "Name,Email,Phone,Status,Company\n\
                    Ada Lovelace,ADA@example.com,,client,Engines\n\
                    Ada Again,ada@example.com,,,\n\
                    ,missing@example.com,,,\n\
                    Grace Hopper,grace@example.com,,,\n";
        let parsed = parse_contacts_csv(tenant(), data).unwrap();

        assert_eq!(parsed.contacts.len(), 2);
        assert_eq!(parsed.contacts[0].email.as_str(), "ada@example.com");
        assert_eq!(parsed.contacts[0].status, ContactStatus::Client);
        assert_eq!(parsed.contacts[1].status, ContactStatus::Lead);
        assert_eq!(parsed.duplicates, 1);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].row, 3);
    }

    #[test]
    fn csv_requires_name_and_email_headers() {
        assert!(matches!(
            parse_contacts_csv(tenant(), "first,last\nA,B\n"),
            Err(FormError::Csv(_))
        ));
    }

    #[test]
    fn payload_defaults_to_lead_and_validates_email() {
        let payload = ContactPayload {
            name: "Ada".to_string(),
            email: "  Ada@Example.com ".to_string(),
            phone: Some(" ".to_string()),
            notes: None,
            status: None,
        };
        let contact = payload.into_new(tenant()).unwrap();
        assert_eq!(contact.status, ContactStatus::Lead);
        assert_eq!(contact.phone, None);
        assert_eq!(contact.email.as_str(), "ada@example.com");

        let bad = ContactPayload {
            name: "Ada".to_string(),
            email: "nope".to_string(),
            phone: None,
            notes: None,
            status: None,
        };
        assert!(matches!(
            bad.into_new(tenant()),
            Err(FormError::Constraint(TypeConstraintError::InvalidEmail))
        ));
    }

    #[test]
    fn empty_field_values_are_dropped() {
        let payload = ContactFieldsPayload {
            fields: HashMap::from([
                ("Company".to_string(), " Acme ".to_string()),
                ("Referral".to_string(), "".to_string()),
            ]),
        };
        let fields = payload.into_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["Company"], "Acme");
    }
}
