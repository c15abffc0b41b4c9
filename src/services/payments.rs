use validator::Validate;

use crate::billing::invoice_status_after_refund;
use crate::domain::invoice::{InvoicePaymentUpdate, InvoiceStatus};
use crate::domain::payment::{Payment, PaymentRefund, PaymentStatus};
use crate::domain::types::{ContactId, InvoiceId, PaymentId, TenantId};
use crate::domain::webhook::WebhookEvent;
use crate::forms::payment::{PaymentListParams, RefundPayload};
use crate::pagination::Paginated;
use crate::repository::{
    InvoiceReader, PaymentListQuery, PaymentReader, PaymentWriter, WebhookReader,
};
use crate::services::{Notifier, ServiceError, ServiceResult, page_params, to_payload, utc_now};

pub fn list_payments<R>(
    repo: &R,
    tenant_id: TenantId,
    params: PaymentListParams,
) -> ServiceResult<Paginated<Payment>>
where
    R: PaymentReader + ?Sized,
{
    let (page, per_page) = page_params(params.page, params.per_page);
    let mut query = PaymentListQuery::new(tenant_id).paginate(page, per_page);
    query.contact_id = params.contact_id.map(ContactId::new).transpose()?;
    query.invoice_id = params.invoice_id.map(InvoiceId::new).transpose()?;
    let (total, payments) = repo.list_payments(query)?;
    Ok(Paginated::new(payments, total, page, per_page))
}

pub fn get_payment<R>(repo: &R, tenant_id: TenantId, id: PaymentId) -> ServiceResult<Payment>
where
    R: PaymentReader + ?Sized,
{
    repo.get_payment_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Payment"))
}

/// Returns money to the payer, fully or in part. The invoice the payment
/// was recorded against is rolled back to match.
pub fn refund_payment<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: PaymentId,
    payload: RefundPayload,
) -> ServiceResult<Payment>
where
    R: PaymentReader + PaymentWriter + InvoiceReader + WebhookReader + ?Sized,
{
    payload.validate()?;
    let payment = get_payment(repo, tenant_id, id)?;
    let refundable = payment.refundable_cents();
    if refundable == 0 {
        return Err(ServiceError::Validation(
            "Payment has already been refunded".to_string(),
        ));
    }
    let amount = payload.amount_cents.unwrap_or(refundable);
    if amount > refundable {
        return Err(ServiceError::Validation(format!(
            "Refund exceeds the refundable amount of {refundable} cents"
        )));
    }

    let now = utc_now();
    let refunded_cents = payment.refunded_cents + amount;
    let refund = PaymentRefund {
        previous_refunded_cents: payment.refunded_cents,
        refunded_cents,
        status: if refunded_cents >= payment.amount_cents {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartialRefund
        },
        refunded_at: now,
    };

    let invoice_update = match payment.invoice_id {
        Some(invoice_id) => repo.get_invoice_by_id(invoice_id, tenant_id)?.map(|invoice| {
            let amount_paid_cents = (invoice.amount_paid_cents - amount).max(0);
            let status = if invoice.status == InvoiceStatus::Cancelled {
                InvoiceStatus::Cancelled
            } else {
                invoice_status_after_refund(
                    invoice.total_cents,
                    amount_paid_cents,
                    invoice.sent_at.is_some(),
                )
            };
            let paid_at = (status == InvoiceStatus::Paid)
                .then_some(invoice.paid_at)
                .flatten();
            (
                invoice.id,
                InvoicePaymentUpdate {
                    previous_paid_cents: invoice.amount_paid_cents,
                    amount_paid_cents,
                    status,
                    paid_at,
                },
            )
        }),
        None => None,
    };

    let payment = repo
        .refund_payment(payment.id, &refund, invoice_update)
        .map_err(|err| {
            log::error!("Failed to refund payment {id}: {err}");
            err
        })?;
    log::info!("Refunded {amount} cents of payment {}", payment.id);

    notifier.webhook(repo, tenant_id, WebhookEvent::PaymentRefunded, to_payload(&payment));
    Ok(payment)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::invoice::Invoice;
    use crate::domain::payment::PaymentMethod;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{self, now, tenant_id};

    fn payment(amount: i32, refunded: i32) -> Payment {
        Payment {
            id: PaymentId::new(9).unwrap(),
            tenant_id: tenant_id(),
            invoice_id: Some(InvoiceId::new(3).unwrap()),
            contact_id: None,
            amount_cents: amount,
            method: PaymentMethod::Zelle,
            status: PaymentStatus::Succeeded,
            is_deposit: false,
            notes: None,
            refunded_cents: refunded,
            refunded_at: None,
            created_at: now(),
        }
    }

    fn paid_invoice() -> Invoice {
        Invoice {
            id: InvoiceId::new(3).unwrap(),
            tenant_id: tenant_id(),
            contact_id: None,
            invoice_number: "INV-00003".to_string(),
            status: InvoiceStatus::Paid,
            due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            line_items: vec![],
            subtotal_cents: 10_000,
            tax_rate_bp: 0,
            tax_cents: 0,
            total_cents: 10_000,
            amount_paid_cents: 10_000,
            contact_name: "Ada".to_string(),
            contact_email: "ada@example.com".to_string(),
            notes: None,
            sent_at: Some(now()),
            paid_at: Some(now()),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn full_refund_reopens_the_invoice() {
        let mut repo = MockRepository::new();
        repo.expect_get_payment_by_id()
            .returning(|_, _| Ok(Some(payment(10_000, 0))));
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(paid_invoice())));
        repo.expect_refund_payment()
            .withf(|_, refund, invoice_update| {
                refund.refunded_cents == 10_000
                    && refund.status == PaymentStatus::Refunded
                    && matches!(
                        invoice_update,
                        Some((_, update)) if update.amount_paid_cents == 0
                            && update.status == InvoiceStatus::Sent
                            && update.paid_at.is_none()
                    )
            })
            .times(1)
            .returning(|_, refund, _| {
                let mut refunded = payment(10_000, refund.refunded_cents);
                refunded.status = refund.status;
                Ok(refunded)
            });
        repo.expect_list_subscribed_webhooks()
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();

        let refunded = refund_payment(
            &repo,
            &test.notifier,
            tenant_id(),
            PaymentId::new(9).unwrap(),
            RefundPayload::default(),
        )
        .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
    }

    #[test]
    fn partial_refund_keeps_a_deposit() {
        let mut repo = MockRepository::new();
        repo.expect_get_payment_by_id()
            .returning(|_, _| Ok(Some(payment(10_000, 0))));
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(paid_invoice())));
        repo.expect_refund_payment()
            .withf(|_, refund, invoice_update| {
                refund.status == PaymentStatus::PartialRefund
                    && refund.previous_refunded_cents == 0
                    && matches!(
                        invoice_update,
                        Some((_, update)) if update.previous_paid_cents == 10_000
                            && update.amount_paid_cents == 7_500
                            && update.status == InvoiceStatus::DepositPaid
                    )
            })
            .times(1)
            .returning(|_, _, _| Ok(payment(10_000, 2_500)));
        repo.expect_list_subscribed_webhooks()
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();
        let payload = RefundPayload {
            amount_cents: Some(2_500),
        };

        let refunded = refund_payment(
            &repo,
            &test.notifier,
            tenant_id(),
            PaymentId::new(9).unwrap(),
            payload,
        )
        .unwrap();
        assert_eq!(refunded.refundable_cents(), 7_500);
    }

    #[test]
    fn refund_cannot_exceed_what_is_left() {
        let mut repo = MockRepository::new();
        repo.expect_get_payment_by_id()
            .returning(|_, _| Ok(Some(payment(10_000, 8_000))));
        repo.expect_refund_payment().times(0);
        let test = fixtures::notifier();
        let payload = RefundPayload {
            amount_cents: Some(2_001),
        };

        let result = refund_payment(
            &repo,
            &test.notifier,
            tenant_id(),
            PaymentId::new(9).unwrap(),
            payload,
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn concurrent_refund_is_reported_as_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_get_payment_by_id()
            .returning(|_, _| Ok(Some(payment(10_000, 0))));
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(paid_invoice())));
        repo.expect_refund_payment()
            .times(1)
            .returning(|id, _, _| Err(RepositoryError::StaleWrite(format!("payment {id}"))));
        repo.expect_list_subscribed_webhooks().times(0);
        let test = fixtures::notifier();

        let result = refund_payment(
            &repo,
            &test.notifier,
            tenant_id(),
            PaymentId::new(9).unwrap(),
            RefundPayload::default(),
        );
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }
}
