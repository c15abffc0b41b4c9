use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::payment::{
    NewPayment as DomainNewPayment, Payment as DomainPayment, PaymentRefund,
};
use crate::domain::types::{ContactId, InvoiceId, PaymentId, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
/// Diesel model for [`crate::domain::payment::Payment`].
pub struct Payment {
    pub id: i32,
    pub tenant_id: i32,
    pub invoice_id: Option<i32>,
    pub contact_id: Option<i32>,
    pub amount_cents: i32,
    pub method: String,
    pub status: String,
    pub is_deposit: bool,
    pub notes: Option<String>,
    pub refunded_cents: i32,
    pub refunded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment<'a> {
    pub tenant_id: i32,
    pub invoice_id: Option<i32>,
    pub contact_id: Option<i32>,
    pub amount_cents: i32,
    pub method: &'a str,
    pub is_deposit: bool,
    pub notes: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::payments)]
pub struct UpdatePaymentRefund<'a> {
    pub refunded_cents: i32,
    pub status: &'a str,
    pub refunded_at: Option<NaiveDateTime>,
}

impl TryFrom<Payment> for DomainPayment {
    type Error = TypeConstraintError;

    fn try_from(payment: Payment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::try_from(payment.id)?,
            tenant_id: TenantId::try_from(payment.tenant_id)?,
            invoice_id: payment.invoice_id.map(InvoiceId::try_from).transpose()?,
            contact_id: payment.contact_id.map(ContactId::try_from).transpose()?,
            amount_cents: payment.amount_cents,
            method: payment.method.parse()?,
            status: payment.status.parse()?,
            is_deposit: payment.is_deposit,
            notes: payment.notes,
            refunded_cents: payment.refunded_cents,
            refunded_at: payment.refunded_at,
            created_at: payment.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewPayment> for NewPayment<'a> {
    fn from(payment: &'a DomainNewPayment) -> Self {
        Self {
            tenant_id: payment.tenant_id.get(),
            invoice_id: payment.invoice_id.map(|id| id.get()),
            contact_id: payment.contact_id.map(|id| id.get()),
            amount_cents: payment.amount_cents,
            method: payment.method.as_str(),
            is_deposit: payment.is_deposit,
            notes: payment.notes.as_deref(),
        }
    }
}

impl<'a> From<&'a PaymentRefund> for UpdatePaymentRefund<'a> {
    fn from(refund: &'a PaymentRefund) -> Self {
        Self {
            refunded_cents: refund.refunded_cents,
            status: refund.status.as_str(),
            refunded_at: Some(refund.refunded_at),
        }
    }
}
