//! Invoices, delivery to the client and offline payment recording.

use validator::Validate;

use crate::billing::{
    allocate_invoice_payment, calculate_invoice_totals, invoice_status_after_payment,
};
use crate::domain::invoice::{
    Invoice, InvoicePaymentUpdate, InvoiceStatus, NewInvoice, UpdateInvoice,
};
use crate::domain::payment::NewPayment;
use crate::domain::types::{ContactId, InvoiceId, TenantId};
use crate::domain::webhook::WebhookEvent;
use crate::domain::workflow::{WorkflowSubject, WorkflowTrigger};
use crate::dto::invoice::{InvoiceDetail, RecordedPayment};
use crate::email::{INVOICE_SENT, OutgoingEmail, pick_template, render_template};
use crate::formatters::format_currency;
use crate::forms::clean_text;
use crate::forms::invoice::{
    InvoiceDraft, InvoiceListParams, InvoicePayload, RecordPaymentPayload,
};
use crate::pagination::Paginated;
use crate::repository::{
    InvoiceListQuery, InvoiceReader, InvoiceWriter, PaymentListQuery, PaymentReader,
};
use crate::services::workflows::{WorkflowStore, template_variables, trigger_workflows};
use crate::services::{Notifier, ServiceError, ServiceResult, page_params, to_payload, utc_now};

fn load_invoice<R>(repo: &R, tenant_id: TenantId, id: InvoiceId) -> ServiceResult<Invoice>
where
    R: InvoiceReader + ?Sized,
{
    repo.get_invoice_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Invoice"))
}

fn invoice_subject(invoice: &Invoice) -> WorkflowSubject {
    WorkflowSubject {
        contact_id: invoice.contact_id,
        invoice_id: Some(invoice.id),
        ..WorkflowSubject::default()
    }
}

/// Recipient of an invoice. Missing name and email are taken from the
/// linked contact.
struct Recipient {
    contact_id: Option<ContactId>,
    name: String,
    email: String,
}

fn resolve_recipient<R>(
    repo: &R,
    tenant_id: TenantId,
    draft: &InvoiceDraft,
) -> ServiceResult<Recipient>
where
    R: WorkflowStore + ?Sized,
{
    let contact = match draft.contact_id {
        Some(id) => Some(
            repo.get_contact_by_id(id, tenant_id)?
                .ok_or_else(|| ServiceError::Validation("Contact does not exist".to_string()))?,
        ),
        None => None,
    };
    let name = draft
        .contact_name
        .clone()
        .or_else(|| contact.as_ref().map(|c| c.name.to_string()))
        .unwrap_or_default();
    let email = draft
        .contact_email
        .as_ref()
        .map(|e| e.to_string())
        .or_else(|| contact.as_ref().map(|c| c.email.to_string()))
        .unwrap_or_default();
    Ok(Recipient {
        contact_id: draft.contact_id,
        name,
        email,
    })
}

pub fn list_invoices<R>(
    repo: &R,
    tenant_id: TenantId,
    params: InvoiceListParams,
) -> ServiceResult<Paginated<Invoice>>
where
    R: InvoiceReader + ?Sized,
{
    let (page, per_page) = page_params(params.page, params.per_page);
    let mut query = InvoiceListQuery::new(tenant_id).paginate(page, per_page);
    if let Some(contact_id) = params.contact_id {
        query = query.contact(ContactId::new(contact_id)?);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    let (total, invoices) = repo.list_invoices(query)?;
    Ok(Paginated::new(invoices, total, page, per_page))
}

pub fn get_invoice<R>(repo: &R, tenant_id: TenantId, id: InvoiceId) -> ServiceResult<InvoiceDetail>
where
    R: InvoiceReader + PaymentReader + ?Sized,
{
    let invoice = load_invoice(repo, tenant_id, id)?;
    let booking_ids = repo.list_invoice_booking_ids(invoice.id)?;
    let mut query = PaymentListQuery::new(tenant_id);
    query.invoice_id = Some(invoice.id);
    let (_, payments) = repo.list_payments(query)?;
    Ok(InvoiceDetail {
        balance_due_cents: invoice.balance_due_cents(),
        invoice,
        booking_ids,
        payments,
    })
}

/// Creates a draft invoice numbered per tenant.
pub fn create_invoice<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    payload: InvoicePayload,
) -> ServiceResult<Invoice>
where
    R: WorkflowStore + InvoiceWriter + ?Sized,
{
    let draft = payload.into_draft()?;
    let recipient = resolve_recipient(repo, tenant_id, &draft)?;
    if !draft.booking_ids.is_empty() {
        let bookings = repo.get_bookings_by_ids(tenant_id, &draft.booking_ids)?;
        if bookings.len() != draft.booking_ids.len() {
            return Err(ServiceError::Validation(
                "One or more bookings do not exist".to_string(),
            ));
        }
    }
    let totals = calculate_invoice_totals(&draft.line_items, draft.tax_rate_bp)?;

    let invoice = repo
        .create_invoice(&NewInvoice {
            tenant_id,
            contact_id: recipient.contact_id,
            due_date: draft.due_date,
            line_items: draft.line_items,
            tax_rate_bp: draft.tax_rate_bp,
            totals,
            contact_name: recipient.name,
            contact_email: recipient.email,
            notes: draft.notes,
            booking_ids: draft.booking_ids,
        })
        .map_err(|err| {
            log::error!("Failed to create invoice for tenant {tenant_id}: {err}");
            err
        })?;
    log::info!("Invoice {} created", invoice.invoice_number);

    notifier.webhook(repo, tenant_id, WebhookEvent::InvoiceCreated, to_payload(&invoice));
    Ok(invoice)
}

/// Replaces the editable invoice fields and recomputes its totals.
pub fn update_invoice<R>(
    repo: &R,
    tenant_id: TenantId,
    id: InvoiceId,
    payload: InvoicePayload,
) -> ServiceResult<Invoice>
where
    R: WorkflowStore + InvoiceWriter + ?Sized,
{
    let existing = load_invoice(repo, tenant_id, id)?;
    let draft = payload.into_draft()?;
    let recipient = resolve_recipient(repo, tenant_id, &draft)?;
    let totals = calculate_invoice_totals(&draft.line_items, draft.tax_rate_bp)?;
    if totals.total_cents < existing.amount_paid_cents {
        return Err(ServiceError::Validation(
            "Invoice total cannot be less than the amount already paid".to_string(),
        ));
    }

    let updates = UpdateInvoice {
        status: draft.status.unwrap_or(existing.status),
        due_date: draft.due_date,
        line_items: draft.line_items,
        tax_rate_bp: draft.tax_rate_bp,
        totals,
        contact_name: recipient.name,
        contact_email: recipient.email,
        notes: draft.notes,
    };
    Ok(repo.update_invoice(id, tenant_id, &updates)?)
}

/// Only drafts can be deleted.
pub fn delete_invoice<R>(repo: &R, tenant_id: TenantId, id: InvoiceId) -> ServiceResult<()>
where
    R: InvoiceReader + InvoiceWriter + ?Sized,
{
    let invoice = load_invoice(repo, tenant_id, id)?;
    if invoice.status != InvoiceStatus::Draft {
        return Err(ServiceError::Validation(
            "Only draft invoices can be deleted".to_string(),
        ));
    }
    Ok(repo.delete_invoice(id, tenant_id)?)
}

/// Emails the invoice to its recipient and marks it sent.
pub fn send_invoice<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: InvoiceId,
) -> ServiceResult<Invoice>
where
    R: WorkflowStore + InvoiceWriter + ?Sized,
{
    let invoice = load_invoice(repo, tenant_id, id)?;
    if invoice.status == InvoiceStatus::Cancelled {
        return Err(ServiceError::Validation(
            "Cancelled invoices cannot be sent".to_string(),
        ));
    }
    if invoice.contact_email.is_empty() {
        return Err(ServiceError::Validation(
            "Invoice has no recipient email".to_string(),
        ));
    }
    let tenant = repo
        .get_tenant_by_id(tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;
    let contact = match invoice.contact_id {
        Some(contact_id) => repo.get_contact_by_id(contact_id, tenant_id)?,
        None => None,
    };

    let templates = repo.list_email_templates(tenant_id)?;
    let (subject, body) = pick_template(&templates, &INVOICE_SENT);
    let variables = template_variables(
        repo,
        &notifier.app_url,
        &tenant,
        contact.as_ref(),
        None,
        Some(&invoice),
    )?;
    let rendered = render_template(subject, body, &variables)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    if !notifier.send_email(OutgoingEmail {
        to: invoice.contact_email.clone(),
        subject: rendered.subject,
        html: rendered.html,
    }) {
        return Err(ServiceError::Unavailable(
            "Email delivery is unavailable".to_string(),
        ));
    }

    let now = utc_now();
    let invoice = repo.mark_invoice_sent(id, tenant_id, now)?;
    log::info!("Invoice {} sent to {}", invoice.invoice_number, invoice.contact_email);

    notifier.webhook(repo, tenant_id, WebhookEvent::InvoiceSent, to_payload(&invoice));
    trigger_workflows(
        repo,
        notifier,
        tenant_id,
        WorkflowTrigger::InvoiceSent,
        invoice_subject(&invoice),
        now,
    );
    Ok(invoice)
}

/// Records an offline payment and spreads it over the linked bookings in
/// proportion to their prices.
pub fn record_payment<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: InvoiceId,
    payload: RecordPaymentPayload,
) -> ServiceResult<RecordedPayment>
where
    R: WorkflowStore + InvoiceWriter + ?Sized,
{
    payload.validate()?;

    let invoice = load_invoice(repo, tenant_id, id)?;
    if !invoice.status.accepts_payments() {
        return Err(ServiceError::Validation(format!(
            "A {} invoice does not accept payments",
            invoice.status
        )));
    }
    let balance = invoice.balance_due_cents();
    if payload.amount_cents > balance {
        return Err(ServiceError::Validation(format!(
            "Payment amount ({}) exceeds balance due ({})",
            format_currency(i64::from(payload.amount_cents)),
            format_currency(i64::from(balance)),
        )));
    }

    let booking_ids = repo.list_invoice_booking_ids(invoice.id)?;
    let bookings = if booking_ids.is_empty() {
        Vec::new()
    } else {
        repo.get_bookings_by_ids(tenant_id, &booking_ids)?
    };
    let booking_updates = allocate_invoice_payment(
        invoice.total_cents,
        &bookings,
        payload.amount_cents,
        payload.is_deposit,
    );

    let now = utc_now();
    let amount_paid_cents = invoice.amount_paid_cents + payload.amount_cents;
    let status = invoice_status_after_payment(invoice.total_cents, amount_paid_cents);
    let paid_in_full = status == InvoiceStatus::Paid;
    let invoice_update = InvoicePaymentUpdate {
        previous_paid_cents: invoice.amount_paid_cents,
        amount_paid_cents,
        status,
        paid_at: if paid_in_full { Some(now) } else { invoice.paid_at },
    };
    let new_payment = NewPayment {
        tenant_id,
        invoice_id: Some(invoice.id),
        contact_id: invoice.contact_id,
        amount_cents: payload.amount_cents,
        method: payload.method,
        is_deposit: payload.is_deposit,
        notes: clean_text(payload.notes),
    };

    let payment = repo
        .record_invoice_payment(&new_payment, invoice.id, &invoice_update, &booking_updates)
        .map_err(|err| {
            log::error!("Failed to record payment on invoice {}: {err}", invoice.id);
            err
        })?;
    let invoice = load_invoice(repo, tenant_id, id)?;
    log::info!(
        "Recorded {} cents on invoice {}",
        payment.amount_cents,
        invoice.invoice_number
    );

    notifier.webhook(repo, tenant_id, WebhookEvent::PaymentReceived, to_payload(&payment));
    trigger_workflows(
        repo,
        notifier,
        tenant_id,
        WorkflowTrigger::PaymentReceived,
        invoice_subject(&invoice),
        now,
    );
    if paid_in_full {
        notifier.webhook(repo, tenant_id, WebhookEvent::InvoicePaid, to_payload(&invoice));
        trigger_workflows(
            repo,
            notifier,
            tenant_id,
            WorkflowTrigger::InvoicePaid,
            invoice_subject(&invoice),
            now,
        );
    }

    Ok(RecordedPayment { payment, invoice })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::domain::booking::{BookingPaymentStatus, BookingStatus};
    use crate::domain::invoice::LineItem;
    use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
    use crate::domain::types::PaymentId;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{self, now, tenant_id};

    fn invoice(status: InvoiceStatus, total: i32, paid: i32) -> Invoice {
        Invoice {
            id: InvoiceId::new(3).unwrap(),
            tenant_id: tenant_id(),
            contact_id: Some(ContactId::new(1).unwrap()),
            invoice_number: "INV-00003".to_string(),
            status,
            due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            line_items: vec![LineItem {
                description: "Cleaning".to_string(),
                quantity: 1,
                unit_price_cents: total,
            }],
            subtotal_cents: total,
            tax_rate_bp: 0,
            tax_cents: 0,
            total_cents: total,
            amount_paid_cents: paid,
            contact_name: "Ada Lovelace".to_string(),
            contact_email: "ada1@example.com".to_string(),
            notes: None,
            sent_at: None,
            paid_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn payment(amount: i32) -> Payment {
        Payment {
            id: PaymentId::new(9).unwrap(),
            tenant_id: tenant_id(),
            invoice_id: Some(InvoiceId::new(3).unwrap()),
            contact_id: Some(ContactId::new(1).unwrap()),
            amount_cents: amount,
            method: PaymentMethod::Cash,
            status: PaymentStatus::Succeeded,
            is_deposit: false,
            notes: None,
            refunded_cents: 0,
            refunded_at: None,
            created_at: now(),
        }
    }

    fn record(amount: i32) -> RecordPaymentPayload {
        RecordPaymentPayload {
            amount_cents: amount,
            method: PaymentMethod::Cash,
            is_deposit: false,
            notes: None,
        }
    }

    fn silent_side_effects(repo: &mut MockRepository) {
        repo.expect_list_subscribed_webhooks()
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .returning(|_, _| Ok(vec![]));
    }

    #[test]
    fn invoice_recipient_comes_from_the_contact() {
        let mut repo = MockRepository::new();
        repo.expect_get_contact_by_id()
            .returning(|id, _| Ok(Some(fixtures::contact(id.get()))));
        repo.expect_create_invoice()
            .withf(|new| {
                new.contact_email == "ada1@example.com"
                    && new.contact_name == "Ada Lovelace"
                    && new.totals.subtotal_cents == 10_000
                    && new.totals.tax_cents == 825
                    && new.totals.total_cents == 10_825
            })
            .times(1)
            .returning(|_| Ok(invoice(InvoiceStatus::Draft, 10_825, 0)));
        silent_side_effects(&mut repo);
        let payload: InvoicePayload = serde_json::from_value(json!({
            "contact_id": 1,
            "due_date": "2026-02-01",
            "tax_rate_bp": 825,
            "line_items": [{"description": "Cleaning", "quantity": 2, "unit_price_cents": 5000}]
        }))
        .unwrap();
        let test = fixtures::notifier();

        let created = create_invoice(&repo, &test.notifier, tenant_id(), payload).unwrap();
        assert_eq!(created.status, InvoiceStatus::Draft);
    }

    #[test]
    fn unknown_bookings_are_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_contact_by_id()
            .returning(|id, _| Ok(Some(fixtures::contact(id.get()))));
        repo.expect_get_bookings_by_ids().returning(|_, _| {
            Ok(vec![fixtures::booking(4, fixtures::at(5, 9, 0), BookingStatus::Confirmed)])
        });
        repo.expect_create_invoice().times(0);
        let payload: InvoicePayload = serde_json::from_value(json!({
            "contact_id": 1,
            "due_date": "2026-02-01",
            "booking_ids": [4, 5],
            "line_items": [{"description": "Cleaning", "quantity": 1, "unit_price_cents": 5000}]
        }))
        .unwrap();
        let test = fixtures::notifier();

        let result = create_invoice(&repo, &test.notifier, tenant_id(), payload);
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn payment_above_balance_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(invoice(InvoiceStatus::Sent, 10_000, 6_000))));
        repo.expect_record_invoice_payment().times(0);
        let test = fixtures::notifier();

        let id = InvoiceId::new(3).unwrap();
        let result = record_payment(&repo, &test.notifier, tenant_id(), id, record(4_001));
        assert!(matches!(
            result,
            Err(ServiceError::Validation(message)) if message.contains("$40.00")
        ));
    }

    #[test]
    fn paid_invoices_reject_payments() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(invoice(InvoiceStatus::Paid, 10_000, 10_000))));
        let test = fixtures::notifier();

        let id = InvoiceId::new(3).unwrap();
        let result = record_payment(&repo, &test.notifier, tenant_id(), id, record(100));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn full_payment_is_allocated_and_marks_paid() {
        let mut repo = MockRepository::new();
        let mut calls = 0;
        repo.expect_get_invoice_by_id().returning(move |_, _| {
            calls += 1;
            let paid = if calls == 1 { 0 } else { 10_000 };
            let status = if calls == 1 { InvoiceStatus::Sent } else { InvoiceStatus::Paid };
            Ok(Some(invoice(status, 10_000, paid)))
        });
        let linked = fixtures::booking(4, fixtures::at(5, 9, 0), BookingStatus::Confirmed);
        let linked_id = linked.id;
        repo.expect_list_invoice_booking_ids()
            .returning(move |_| Ok(vec![linked_id]));
        repo.expect_get_bookings_by_ids()
            .returning(move |_, _| Ok(vec![linked.clone()]));
        repo.expect_record_invoice_payment()
            .withf(|new, _, update, bookings| {
                new.amount_cents == 10_000
                    && update.status == InvoiceStatus::Paid
                    && update.paid_at.is_some()
                    && bookings.len() == 1
                    && bookings[0].payment_status == BookingPaymentStatus::Paid
            })
            .times(1)
            .returning(|new, _, _, _| Ok(payment(new.amount_cents)));
        repo.expect_list_subscribed_webhooks()
            .withf(|_, event| {
                matches!(event, WebhookEvent::PaymentReceived | WebhookEvent::InvoicePaid)
            })
            .times(2)
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .withf(|_, trigger| {
                matches!(trigger, WorkflowTrigger::PaymentReceived | WorkflowTrigger::InvoicePaid)
            })
            .times(2)
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();

        let recorded = record_payment(
            &repo,
            &test.notifier,
            tenant_id(),
            InvoiceId::new(3).unwrap(),
            record(10_000),
        )
        .unwrap();
        assert_eq!(recorded.invoice.status, InvoiceStatus::Paid);
        assert_eq!(recorded.payment.amount_cents, 10_000);
    }

    #[test]
    fn sent_invoices_cannot_be_deleted() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(invoice(InvoiceStatus::Sent, 10_000, 0))));
        repo.expect_delete_invoice().times(0);

        let result = delete_invoice(&repo, tenant_id(), InvoiceId::new(3).unwrap());
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn sending_emails_the_recipient() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(invoice(InvoiceStatus::Draft, 10_000, 0))));
        repo.expect_get_tenant_by_id()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_contact_by_id()
            .returning(|id, _| Ok(Some(fixtures::contact(id.get()))));
        repo.expect_list_email_templates().returning(|_| Ok(vec![]));
        repo.expect_mark_invoice_sent()
            .times(1)
            .returning(|_, _, sent_at| {
                let mut sent = invoice(InvoiceStatus::Sent, 10_000, 0);
                sent.sent_at = Some(sent_at);
                Ok(sent)
            });
        silent_side_effects(&mut repo);
        let test = fixtures::notifier();

        let id = InvoiceId::new(3).unwrap();
        let sent = send_invoice(&repo, &test.notifier, tenant_id(), id).unwrap();
        assert_eq!(sent.status, InvoiceStatus::Sent);
        let emails = test.sent_emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, "ada1@example.com");
        assert!(emails[0].subject.contains("INV-00003"));
    }
}
