use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{ContactId, InvoiceId, PaymentId, TenantId, text_enum};

text_enum!(
    /// Ways a manually recorded payment may have been made.
    PaymentMethod {
        Cash => "cash",
        Check => "check",
        Venmo => "venmo",
        Zelle => "zelle",
        BankTransfer => "bank_transfer",
        Other => "other",
    }
);

text_enum!(
    /// Settlement status of a payment.
    PaymentStatus {
        Succeeded => "succeeded",
        PartialRefund => "partial_refund",
        Refunded => "refunded",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub invoice_id: Option<InvoiceId>,
    pub contact_id: Option<ContactId>,
    pub amount_cents: i32,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub is_deposit: bool,
    pub notes: Option<String>,
    pub refunded_cents: i32,
    pub refunded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Payment {
    pub fn refundable_cents(&self) -> i32 {
        (self.amount_cents - self.refunded_cents).max(0)
    }
}

#[derive(Clone, Debug)]
pub struct NewPayment {
    pub tenant_id: TenantId,
    pub invoice_id: Option<InvoiceId>,
    pub contact_id: Option<ContactId>,
    pub amount_cents: i32,
    pub method: PaymentMethod,
    pub is_deposit: bool,
    pub notes: Option<String>,
}

/// Refund bookkeeping for a payment. Applies only while the stored refunded
/// amount still equals `previous_refunded_cents`.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentRefund {
    pub previous_refunded_cents: i32,
    pub refunded_cents: i32,
    pub status: PaymentStatus,
    pub refunded_at: NaiveDateTime,
}
