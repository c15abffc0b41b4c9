use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::invoice::{
    Invoice as DomainInvoice, InvoicePaymentUpdate, LineItem, NewInvoice as DomainNewInvoice,
    UpdateInvoice as DomainUpdateInvoice,
};
use crate::domain::types::{ContactId, InvoiceId, TenantId};
use crate::repository::errors::RepositoryError;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::invoices)]
/// Diesel model for [`crate::domain::invoice::Invoice`]. Line items are
/// stored as a JSON array.
pub struct Invoice {
    pub id: i32,
    pub tenant_id: i32,
    pub contact_id: Option<i32>,
    pub invoice_number: String,
    pub status: String,
    pub due_date: NaiveDate,
    pub line_items: String,
    pub subtotal_cents: i32,
    pub tax_rate_bp: i32,
    pub tax_cents: i32,
    pub total_cents: i32,
    pub amount_paid_cents: i32,
    pub contact_name: String,
    pub contact_email: String,
    pub notes: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::invoices)]
pub struct NewInvoice<'a> {
    pub tenant_id: i32,
    pub contact_id: Option<i32>,
    pub invoice_number: String,
    pub due_date: NaiveDate,
    pub line_items: String,
    pub subtotal_cents: i32,
    pub tax_rate_bp: i32,
    pub tax_cents: i32,
    pub total_cents: i32,
    pub contact_name: &'a str,
    pub contact_email: &'a str,
    pub notes: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateInvoice<'a> {
    pub status: &'a str,
    pub due_date: NaiveDate,
    pub line_items: String,
    pub subtotal_cents: i32,
    pub tax_rate_bp: i32,
    pub tax_cents: i32,
    pub total_cents: i32,
    pub contact_name: &'a str,
    pub contact_email: &'a str,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateInvoicePayment<'a> {
    pub amount_paid_cents: i32,
    pub status: &'a str,
    pub paid_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::invoice_bookings)]
pub struct InvoiceBooking {
    pub invoice_id: i32,
    pub booking_id: i32,
}

impl TryFrom<Invoice> for DomainInvoice {
    type Error = RepositoryError;

    fn try_from(invoice: Invoice) -> Result<Self, Self::Error> {
        let line_items: Vec<LineItem> = serde_json::from_str(&invoice.line_items)?;
        Ok(Self {
            id: InvoiceId::try_from(invoice.id)?,
            tenant_id: TenantId::try_from(invoice.tenant_id)?,
            contact_id: invoice.contact_id.map(ContactId::try_from).transpose()?,
            invoice_number: invoice.invoice_number,
            status: invoice.status.parse()?,
            due_date: invoice.due_date,
            line_items,
            subtotal_cents: invoice.subtotal_cents,
            tax_rate_bp: invoice.tax_rate_bp,
            tax_cents: invoice.tax_cents,
            total_cents: invoice.total_cents,
            amount_paid_cents: invoice.amount_paid_cents,
            contact_name: invoice.contact_name,
            contact_email: invoice.contact_email,
            notes: invoice.notes,
            sent_at: invoice.sent_at,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        })
    }
}

impl<'a> NewInvoice<'a> {
    pub fn new(
        invoice: &'a DomainNewInvoice,
        invoice_number: String,
    ) -> Result<Self, RepositoryError> {
        Ok(Self {
            tenant_id: invoice.tenant_id.get(),
            contact_id: invoice.contact_id.map(|id| id.get()),
            invoice_number,
            due_date: invoice.due_date,
            line_items: serde_json::to_string(&invoice.line_items)?,
            subtotal_cents: invoice.totals.subtotal_cents,
            tax_rate_bp: invoice.tax_rate_bp,
            tax_cents: invoice.totals.tax_cents,
            total_cents: invoice.totals.total_cents,
            contact_name: &invoice.contact_name,
            contact_email: &invoice.contact_email,
            notes: invoice.notes.as_deref(),
        })
    }
}

impl<'a> TryFrom<&'a DomainUpdateInvoice> for UpdateInvoice<'a> {
    type Error = RepositoryError;

    fn try_from(invoice: &'a DomainUpdateInvoice) -> Result<Self, Self::Error> {
        Ok(Self {
            status: invoice.status.as_str(),
            due_date: invoice.due_date,
            line_items: serde_json::to_string(&invoice.line_items)?,
            subtotal_cents: invoice.totals.subtotal_cents,
            tax_rate_bp: invoice.tax_rate_bp,
            tax_cents: invoice.totals.tax_cents,
            total_cents: invoice.totals.total_cents,
            contact_name: &invoice.contact_name,
            contact_email: &invoice.contact_email,
            notes: invoice.notes.as_deref(),
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }
}

impl<'a> From<&'a InvoicePaymentUpdate> for UpdateInvoicePayment<'a> {
    fn from(update: &'a InvoicePaymentUpdate) -> Self {
        Self {
            amount_paid_cents: update.amount_paid_cents,
            status: update.status.as_str(),
            paid_at: update.paid_at,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Formats the `n`-th invoice number of a tenant.
pub fn invoice_number(sequence: i64) -> String {
    format!("INV-{sequence:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_numbers_are_zero_padded() {
        assert_eq!(invoice_number(1), "INV-00001");
        assert_eq!(invoice_number(123_456), "INV-123456");
    }

    #[test]
    fn malformed_line_items_are_reported() {
        let now = chrono::Utc::now().naive_utc();
        let row = Invoice {
            id: 1,
            tenant_id: 1,
            contact_id: None,
            invoice_number: invoice_number(1),
            status: "draft".to_string(),
            due_date: now.date(),
            line_items: "not json".to_string(),
            subtotal_cents: 0,
            tax_rate_bp: 0,
            tax_cents: 0,
            total_cents: 0,
            amount_paid_cents: 0,
            contact_name: "Ada".to_string(),
            contact_email: "ada@example.com".to_string(),
            notes: None,
            sent_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            DomainInvoice::try_from(row),
            Err(RepositoryError::ValidationError(_))
        ));
    }
}
