use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::invoice::{InvoiceStatus, LineItem};
use crate::domain::payment::PaymentMethod;
use crate::domain::types::{BookingId, ContactEmail, ContactId};
use crate::forms::booking::parse_date;
use crate::forms::{FormError, clean_text, trimmed};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemPayload {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub unit_price_cents: i32,
}

impl From<LineItemPayload> for LineItem {
    fn from(item: LineItemPayload) -> Self {
        LineItem {
            description: ammonia::clean(item.description.trim()),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvoicePayload {
    pub contact_id: Option<i32>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub due_date: String,
    #[validate(length(min = 1, message = "an invoice needs at least one line item"), nested)]
    pub line_items: Vec<LineItemPayload>,
    /// Basis points, 825 = 8.25 %.
    #[validate(range(min = 0, max = 10000))]
    pub tax_rate_bp: Option<i32>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub booking_ids: Vec<i32>,
    /// Only honoured on update.
    pub status: Option<InvoiceStatus>,
}

/// Validated invoice fields; the recipient is completed from the contact
/// record by the service layer when only `contact_id` is given.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceDraft {
    pub contact_id: Option<ContactId>,
    pub contact_name: Option<String>,
    pub contact_email: Option<ContactEmail>,
    pub due_date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bp: i32,
    pub notes: Option<String>,
    pub booking_ids: Vec<BookingId>,
    pub status: Option<InvoiceStatus>,
}

impl InvoicePayload {
    pub fn into_draft(self) -> Result<InvoiceDraft, FormError> {
        self.validate()?;
        let contact_id = self.contact_id.map(ContactId::new).transpose()?;
        let contact_email = trimmed(self.contact_email).map(ContactEmail::new).transpose()?;
        if contact_id.is_none() && contact_email.is_none() {
            return Err(FormError::Invalid(
                "either contact_id or contact_email is required".to_string(),
            ));
        }
        let mut booking_ids: Vec<BookingId> = Vec::with_capacity(self.booking_ids.len());
        for id in self.booking_ids {
            let id = BookingId::new(id)?;
            if !booking_ids.contains(&id) {
                booking_ids.push(id);
            }
        }
        Ok(InvoiceDraft {
            contact_id,
            contact_name: clean_text(self.contact_name),
            contact_email,
            due_date: parse_date(&self.due_date)?,
            line_items: self.line_items.into_iter().map(LineItem::from).collect(),
            tax_rate_bp: self.tax_rate_bp.unwrap_or(0),
            notes: clean_text(self.notes),
            booking_ids,
            status: self.status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub contact_id: Option<i32>,
    pub status: Option<InvoiceStatus>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentPayload {
    #[validate(range(min = 1))]
    pub amount_cents: i32,
    pub method: PaymentMethod,
    #[serde(default)]
    pub is_deposit: bool,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> InvoicePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn draft_requires_a_recipient() {
        let draft = payload(json!({
            "due_date": "2026-02-01",
            "line_items": [{"description": "Cleaning", "quantity": 1, "unit_price_cents": 5000}]
        }))
        .into_draft();
        assert!(matches!(draft, Err(FormError::Invalid(_))));
    }

    #[test]
    fn nested_line_items_are_validated() {
        let draft = payload(json!({
            "contact_id": 3,
            "due_date": "2026-02-01",
            "line_items": [{"description": "", "quantity": 0, "unit_price_cents": 5000}]
        }))
        .into_draft();
        assert!(matches!(draft, Err(FormError::Validation(_))));
    }

    #[test]
    fn draft_dedups_bookings_and_defaults_tax() {
        let draft = payload(json!({
            "contact_email": " Ada@Example.com ",
            "due_date": "2026-02-01",
            "line_items": [{"description": "Cleaning", "quantity": 2, "unit_price_cents": 5000}],
            "booking_ids": [4, 4, 5]
        }))
        .into_draft()
        .unwrap();
        assert_eq!(draft.tax_rate_bp, 0);
        assert_eq!(draft.booking_ids.len(), 2);
        assert_eq!(draft.contact_email.unwrap().as_str(), "ada@example.com");
    }
}
