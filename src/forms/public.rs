//! Payloads accepted from the unauthenticated booking widget.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{ContactEmail, ContactName, PhoneNumber};
use crate::forms::booking::{BookingItem, booking_item, parse_date, parse_local_datetime};
use crate::forms::{FormError, clean_text, trimmed};

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub date: String,
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
}

impl AvailabilityParams {
    pub fn date(&self) -> Result<chrono::NaiveDate, FormError> {
        parse_date(&self.date)
    }

    /// Item whose duration sizes the slots; `None` uses the slot interval.
    pub fn item(&self) -> Result<Option<BookingItem>, FormError> {
        match (self.service_id, self.package_id) {
            (None, None) => Ok(None),
            (service, package) => booking_item(service, package).map(Some),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PublicBookingPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
    pub scheduled_at: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Validated widget request.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicBookingRequest {
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: Option<PhoneNumber>,
    pub item: BookingItem,
    pub scheduled_at: chrono::NaiveDateTime,
    pub notes: Option<String>,
}

impl PublicBookingPayload {
    pub fn into_request(self) -> Result<PublicBookingRequest, FormError> {
        self.validate()?;
        Ok(PublicBookingRequest {
            name: ContactName::new(ammonia::clean(&self.name))?,
            email: ContactEmail::new(self.email)?,
            phone: trimmed(self.phone).map(PhoneNumber::new).transpose()?,
            item: booking_item(self.service_id, self.package_id)?,
            scheduled_at: parse_local_datetime(&self.scheduled_at)?,
            notes: clean_text(self.notes),
        })
    }
}

/// Contact details entered on the widget before a slot is picked.
#[derive(Debug, Deserialize, Validate)]
pub struct PublicLeadPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PublicLeadRequest {
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: Option<PhoneNumber>,
}

impl PublicLeadPayload {
    pub fn into_request(self) -> Result<PublicLeadRequest, FormError> {
        self.validate()?;
        Ok(PublicLeadRequest {
            name: ContactName::new(ammonia::clean(&self.name))?,
            email: ContactEmail::new(self.email)?,
            phone: trimmed(self.phone).map(PhoneNumber::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{PackageId, TypeConstraintError};

    #[test]
    fn widget_request_is_normalized() {
        let request = PublicBookingPayload {
            name: "Ada <b>Lovelace</b>".to_string(),
            email: " ADA@example.com ".to_string(),
            phone: None,
            service_id: None,
            package_id: Some(2),
            scheduled_at: "2026-01-05 10:00".to_string(),
            notes: Some("<script>alert(1)</script>".to_string()),
        }
        .into_request()
        .unwrap();
        assert_eq!(request.email.as_str(), "ada@example.com");
        assert_eq!(request.item, BookingItem::Package(PackageId::new(2).unwrap()));
        assert_eq!(request.notes, None);
    }

    #[test]
    fn availability_item_is_optional() {
        let params = AvailabilityParams {
            date: "2026-01-05".to_string(),
            service_id: None,
            package_id: None,
        };
        assert_eq!(params.item().unwrap(), None);
        assert!(params.date().is_ok());
    }

    #[test]
    fn lead_requires_name_and_valid_email() {
        let lead = |name: &str, email: &str| PublicLeadPayload {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some("  ".to_string()),
        };
        let request = lead("Grace", " Grace@Example.com").into_request().unwrap();
        assert_eq!(request.email.as_str(), "grace@example.com");
        assert_eq!(request.phone, None);

        assert!(matches!(
            lead("", "grace@example.com").into_request(),
            Err(FormError::Validation(_))
        ));
        assert!(matches!(
            lead("Grace", "grace@").into_request(),
            Err(FormError::Constraint(TypeConstraintError::InvalidEmail))
        ));
    }
}
