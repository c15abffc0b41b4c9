use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{BookingId, ContactId, InvoiceId, TenantId, text_enum};

text_enum!(
    /// Lifecycle status of an invoice.
    InvoiceStatus {
        Draft => "draft",
        Sent => "sent",
        Viewed => "viewed",
        DepositPaid => "deposit_paid",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
);

impl InvoiceStatus {
    /// Whether the invoice still accepts payments.
    pub fn accepts_payments(self) -> bool {
        !matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

/// One billed row on an invoice.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
}

impl LineItem {
    pub fn amount_cents(&self) -> i64 {
        i64::from(self.quantity) * i64::from(self.unit_price_cents)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub contact_id: Option<ContactId>,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub line_items: Vec<LineItem>,
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

impl Invoice {
    pub fn balance_due_cents(&self) -> i32 {
        (self.total_cents - self.amount_paid_cents).max(0)
    }
}

/// Computed monetary totals of an invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal_cents: i32,
    pub tax_cents: i32,
    pub total_cents: i32,
}

#[derive(Clone, Debug)]
pub struct NewInvoice {
    pub tenant_id: TenantId,
    pub contact_id: Option<ContactId>,
    pub due_date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bp: i32,
    pub totals: InvoiceTotals,
    pub contact_name: String,
    pub contact_email: String,
    pub notes: Option<String>,
    pub booking_ids: Vec<BookingId>,
}

#[derive(Clone, Debug)]
pub struct UpdateInvoice {
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bp: i32,
    pub totals: InvoiceTotals,
    pub contact_name: String,
    pub contact_email: String,
    pub notes: Option<String>,
}

/// Invoice bookkeeping applied together with a recorded payment.
///
/// The update only applies while the stored paid amount still equals
/// `previous_paid_cents`.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoicePaymentUpdate {
    pub previous_paid_cents: i32,
    pub amount_paid_cents: i32,
    pub status: InvoiceStatus,
    pub paid_at: Option<NaiveDateTime>,
}
