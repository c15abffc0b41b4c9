use serde::Serialize;

use crate::domain::invoice::Invoice;
use crate::domain::payment::Payment;
use crate::domain::types::BookingId;

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub balance_due_cents: i32,
    pub booking_ids: Vec<BookingId>,
    pub payments: Vec<Payment>,
}

/// Result of recording a payment against an invoice.
#[derive(Debug, Serialize)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub invoice: Invoice,
}
