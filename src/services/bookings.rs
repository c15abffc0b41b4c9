//! Appointment booking with conflict detection and status lifecycle.

use chrono::{Duration, NaiveDateTime};

use crate::domain::booking::{Booking, BookingStatus, NewBooking, UpdateBooking};
use crate::domain::tenant::Tenant;
use crate::domain::types::{BookingId, PackageId, PublicId, ServiceId, TenantId};
use crate::domain::webhook::WebhookEvent;
use crate::domain::workflow::{WorkflowSubject, WorkflowTrigger};
use crate::email::{
    BOOKING_CANCELLED, BOOKING_CONFIRMATION, DefaultTemplate, OutgoingEmail, pick_template,
    render_template,
};
use crate::forms::booking::{BookingItem, BookingListParams, BookingPayload};
use crate::pagination::Paginated;
use crate::repository::{
    BookingListQuery, BookingReader, BookingWriter, ContactReader, EmailTemplateReader,
    PackageReader, ServiceReader,
};
use crate::schedule::{calculate_adjusted_end_time, find_conflict};
use crate::services::workflows::{WorkflowStore, template_variables, trigger_workflows};
use crate::services::{Notifier, ServiceError, ServiceResult, page_params, to_payload, utc_now};

/// Catalog entry a booking is made for, with its current price and length.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedItem {
    pub service_id: Option<ServiceId>,
    pub package_id: Option<PackageId>,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i32,
}

/// Loads the booked service or package. With `active_only`, inactive items
/// are treated as missing.
pub fn resolve_item<R>(
    repo: &R,
    tenant_id: TenantId,
    item: BookingItem,
    active_only: bool,
) -> ServiceResult<ResolvedItem>
where
    R: ServiceReader + PackageReader + ?Sized,
{
    match item {
        BookingItem::Service(id) => {
            let service = repo
                .get_service_by_id(id, tenant_id)?
                .filter(|s| s.active || !active_only)
                .ok_or_else(|| ServiceError::Validation("Service not available".to_string()))?;
            Ok(ResolvedItem {
                service_id: Some(service.id),
                package_id: None,
                duration_minutes: service.duration_minutes,
                price_cents: service.price_cents,
                name: service.name.into_inner(),
            })
        }
        BookingItem::Package(id) => {
            let package = repo
                .get_package_by_id(id, tenant_id)?
                .filter(|p| p.active || !active_only)
                .ok_or_else(|| ServiceError::Validation("Package not available".to_string()))?;
            Ok(ResolvedItem {
                service_id: None,
                package_id: Some(package.id),
                duration_minutes: package.duration_minutes(),
                price_cents: package.price_cents(),
                name: package.name.into_inner(),
            })
        }
    }
}

/// Rejects a start time whose break-adjusted span overlaps another active
/// booking. `exclude` is the booking being moved.
pub fn ensure_slot_free<R>(
    repo: &R,
    tenant: &Tenant,
    start: NaiveDateTime,
    duration_minutes: i32,
    exclude: Option<BookingId>,
) -> ServiceResult<()>
where
    R: BookingReader + ?Sized,
{
    let window = tenant.break_window();
    let end = calculate_adjusted_end_time(start, duration_minutes, window);
    let existing: Vec<Booking> = repo
        .list_active_bookings_between(tenant.id, start - Duration::days(1), end)?
        .into_iter()
        .filter(|b| Some(b.id) != exclude)
        .collect();

    match find_conflict(start, duration_minutes, window, &existing) {
        Some(other) => {
            log::info!(
                "Rejected booking at {start} for tenant {}: overlaps booking {}",
                tenant.id,
                other.id
            );
            Err(ServiceError::Conflict(
                "This time slot is no longer available".to_string(),
            ))
        }
        None => Ok(()),
    }
}

/// Emails the booking's contact using the tenant's template named like
/// `fallback`. Failures are logged.
pub fn send_booking_email<R>(
    repo: &R,
    notifier: &Notifier,
    tenant: &Tenant,
    booking: &Booking,
    fallback: &DefaultTemplate,
) -> bool
where
    R: ContactReader + EmailTemplateReader + ServiceReader + PackageReader + ?Sized,
{
    let result = (|| -> ServiceResult<bool> {
        let Some(contact) = repo.get_contact_by_id(booking.contact_id, tenant.id)? else {
            return Ok(false);
        };
        let templates = repo.list_email_templates(tenant.id)?;
        let (subject, body) = pick_template(&templates, fallback);
        let variables = template_variables(
            repo,
            &notifier.app_url,
            tenant,
            Some(&contact),
            Some(booking),
            None,
        )?;
        let rendered = render_template(subject, body, &variables)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(notifier.send_email(OutgoingEmail {
            to: contact.email.into_inner(),
            subject: rendered.subject,
            html: rendered.html,
        }))
    })();

    result.unwrap_or_else(|e| {
        log::error!("Failed to send {} for booking {}: {e}", fallback.name, booking.id);
        false
    })
}

fn booking_subject(booking: &Booking) -> WorkflowSubject {
    WorkflowSubject {
        contact_id: Some(booking.contact_id),
        booking_id: Some(booking.id),
        ..WorkflowSubject::default()
    }
}

/// Webhooks, workflows and emails that follow a new booking.
pub(crate) fn after_create<R>(repo: &R, notifier: &Notifier, tenant: &Tenant, booking: &Booking)
where
    R: WorkflowStore + ?Sized,
{
    notifier.webhook(repo, tenant.id, WebhookEvent::BookingCreated, to_payload(booking));
    trigger_workflows(
        repo,
        notifier,
        tenant.id,
        WorkflowTrigger::BookingCreated,
        booking_subject(booking),
        utc_now(),
    );
    if booking.status == BookingStatus::Confirmed {
        after_status_change(repo, notifier, tenant, booking);
    }
}

/// Side effects of a booking entering its current status.
pub(crate) fn after_status_change<R>(
    repo: &R,
    notifier: &Notifier,
    tenant: &Tenant,
    booking: &Booking,
) where
    R: WorkflowStore + ?Sized,
{
    let (event, trigger, template) = match booking.status {
        BookingStatus::Confirmed => (
            WebhookEvent::BookingConfirmed,
            WorkflowTrigger::BookingConfirmed,
            Some(&BOOKING_CONFIRMATION),
        ),
        BookingStatus::Cancelled => (
            WebhookEvent::BookingCancelled,
            WorkflowTrigger::BookingCancelled,
            Some(&BOOKING_CANCELLED),
        ),
        BookingStatus::Completed => (
            WebhookEvent::BookingCompleted,
            WorkflowTrigger::BookingCompleted,
            None,
        ),
        _ => return,
    };

    if let Some(template) = template {
        send_booking_email(repo, notifier, tenant, booking, template);
    }
    notifier.webhook(repo, tenant.id, event, to_payload(booking));
    trigger_workflows(
        repo,
        notifier,
        tenant.id,
        trigger,
        booking_subject(booking),
        utc_now(),
    );
}

pub fn list_bookings<R>(
    repo: &R,
    tenant_id: TenantId,
    params: BookingListParams,
) -> ServiceResult<Paginated<Booking>>
where
    R: BookingReader + ?Sized,
{
    let (page, per_page) = page_params(params.page, params.per_page);
    let (from, to) = params.range()?;
    let mut query = BookingListQuery::new(tenant_id)
        .between(from, to)
        .paginate(page, per_page);
    if let Some(contact_id) = params.contact_id {
        query = query.contact(contact_id.try_into()?);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    let (total, bookings) = repo.list_bookings(query)?;
    Ok(Paginated::new(bookings, total, page, per_page))
}

pub fn get_booking<R>(repo: &R, tenant_id: TenantId, id: BookingId) -> ServiceResult<Booking>
where
    R: BookingReader + ?Sized,
{
    repo.get_booking_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Booking"))
}

pub fn create_booking<R>(
    repo: &R,
    notifier: &Notifier,
    tenant: &Tenant,
    payload: BookingPayload,
) -> ServiceResult<Booking>
where
    R: WorkflowStore + ?Sized,
{
    let draft = payload.into_draft()?;
    repo.get_contact_by_id(draft.contact_id, tenant.id)?
        .ok_or_else(|| ServiceError::Validation("Contact not found".to_string()))?;
    let item = resolve_item(repo, tenant.id, draft.item, false)?;
    let duration_minutes = draft.duration_minutes.unwrap_or(item.duration_minutes);
    ensure_slot_free(repo, tenant, draft.scheduled_at, duration_minutes, None)?;

    let booking = repo
        .create_booking(&NewBooking {
            tenant_id: tenant.id,
            contact_id: draft.contact_id,
            service_id: item.service_id,
            package_id: item.package_id,
            public_id: PublicId::new(),
            scheduled_at: draft.scheduled_at,
            duration_minutes,
            total_price_cents: draft.total_price_cents.unwrap_or(item.price_cents),
            status: draft.status,
            notes: draft.notes,
        })
        .map_err(|err| {
            log::error!("Failed to create booking: {err}");
            err
        })?;

    after_create(repo, notifier, tenant, &booking);
    Ok(booking)
}

/// Edits time, item, price or notes. Moving the booking re-checks conflicts
/// and emits `booking.rescheduled`.
pub fn update_booking<R>(
    repo: &R,
    notifier: &Notifier,
    tenant: &Tenant,
    id: BookingId,
    payload: BookingPayload,
) -> ServiceResult<Booking>
where
    R: WorkflowStore + ?Sized,
{
    let current = get_booking(repo, tenant.id, id)?;
    if current.status.is_terminal() {
        return Err(ServiceError::Validation(format!(
            "A {} booking cannot be edited",
            current.status
        )));
    }
    let draft = payload.into_draft()?;
    let item = resolve_item(repo, tenant.id, draft.item, false)?;
    let duration_minutes = draft.duration_minutes.unwrap_or(item.duration_minutes);
    let moved = draft.scheduled_at != current.scheduled_at
        || duration_minutes != current.duration_minutes;
    if moved {
        ensure_slot_free(repo, tenant, draft.scheduled_at, duration_minutes, Some(id))?;
    }

    let booking = repo.update_booking(
        id,
        tenant.id,
        &UpdateBooking {
            service_id: item.service_id,
            package_id: item.package_id,
            scheduled_at: draft.scheduled_at,
            duration_minutes,
            total_price_cents: draft.total_price_cents.unwrap_or(item.price_cents),
            notes: draft.notes,
        },
    )?;

    if draft.scheduled_at != current.scheduled_at {
        notifier.webhook(
            repo,
            tenant.id,
            WebhookEvent::BookingRescheduled,
            serde_json::json!({
                "booking": to_payload(&booking),
                "previous_scheduled_at": current.scheduled_at,
            }),
        );
    }
    Ok(booking)
}

/// Moves a booking along its lifecycle. Re-applying the current status is a
/// no-op without side effects.
pub fn update_booking_status<R>(
    repo: &R,
    notifier: &Notifier,
    tenant: &Tenant,
    id: BookingId,
    status: BookingStatus,
) -> ServiceResult<Booking>
where
    R: WorkflowStore + ?Sized,
{
    let current = get_booking(repo, tenant.id, id)?;
    if current.status == status {
        return Ok(current);
    }
    if !current.status.can_transition_to(status) {
        return Err(ServiceError::Validation(format!(
            "Cannot change booking from {} to {status}",
            current.status
        )));
    }

    let booking = repo.update_booking_status(id, tenant.id, status)?;
    log::info!("Booking {id} moved from {} to {status}", current.status);
    after_status_change(repo, notifier, tenant, &booking);
    Ok(booking)
}

pub fn delete_booking<R>(repo: &R, tenant_id: TenantId, id: BookingId) -> ServiceResult<()>
where
    R: BookingReader + BookingWriter + ?Sized,
{
    get_booking(repo, tenant_id, id)?;
    Ok(repo.delete_booking(id, tenant_id)?)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::types::ClockTime;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{self, at};

    fn payload(scheduled_at: &str) -> BookingPayload {
        BookingPayload {
            contact_id: 1,
            service_id: Some(1),
            package_id: None,
            scheduled_at: scheduled_at.to_string(),
            duration_minutes: None,
            total_price_cents: None,
            status: None,
            notes: None,
        }
    }

    fn tenant_with_break() -> Tenant {
        let mut tenant = fixtures::tenant();
        tenant.break_start = Some(ClockTime::parse("12:00").unwrap());
        tenant.break_end = Some(ClockTime::parse("13:00").unwrap());
        tenant
    }

    #[test]
    fn overlapping_bookings_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_bookings_between()
            .returning(|_, _, _| {
                Ok(vec![fixtures::booking(9, at(5, 10, 0), BookingStatus::Confirmed)])
            });

        let result = ensure_slot_free(&repo, &fixtures::tenant(), at(5, 9, 30), 60, None);
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let result = ensure_slot_free(&repo, &fixtures::tenant(), at(5, 9, 0), 60, None);
        assert!(result.is_ok());
    }

    #[test]
    fn moving_a_booking_ignores_itself() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_bookings_between()
            .returning(|_, _, _| {
                Ok(vec![fixtures::booking(9, at(5, 10, 0), BookingStatus::Confirmed)])
            });

        let result = ensure_slot_free(
            &repo,
            &fixtures::tenant(),
            at(5, 10, 30),
            60,
            Some(BookingId::new(9).unwrap()),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn appointments_spanning_the_break_are_extended() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_bookings_between()
            .returning(|_, _, _| {
                Ok(vec![fixtures::booking(9, at(5, 13, 30), BookingStatus::Pending)])
            });

        // 11:30 + 90 min runs through the 12:00 break and ends at 14:00.
        let result = ensure_slot_free(&repo, &tenant_with_break(), at(5, 11, 30), 90, None);
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        let result = ensure_slot_free(&repo, &fixtures::tenant(), at(5, 11, 30), 90, None);
        assert!(result.is_ok());
    }

    #[test]
    fn creation_uses_service_defaults_and_fires_events() {
        let mut repo = MockRepository::new();
        repo.expect_get_contact_by_id()
            .returning(|_, _| Ok(Some(fixtures::contact(1))));
        repo.expect_get_service_by_id()
            .returning(|_, _| Ok(Some(fixtures::service(1, 45, 7_500))));
        repo.expect_list_active_bookings_between()
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_create_booking()
            .withf(|b| {
                b.duration_minutes == 45
                    && b.total_price_cents == 7_500
                    && b.status == BookingStatus::Pending
            })
            .times(1)
            .returning(|b| {
                let mut booking = fixtures::booking(3, b.scheduled_at, b.status);
                booking.duration_minutes = b.duration_minutes;
                Ok(booking)
            });
        repo.expect_list_subscribed_webhooks()
            .withf(|_, event| *event == WebhookEvent::BookingCreated)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .withf(|_, trigger| *trigger == WorkflowTrigger::BookingCreated)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();

        let booking =
            create_booking(&repo, &test.notifier, &fixtures::tenant(), payload("2026-01-05T09:00"))
                .unwrap();
        assert_eq!(booking.duration_minutes, 45);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_booking_by_id()
            .returning(|_, _| {
                Ok(Some(fixtures::booking(1, at(5, 9, 0), BookingStatus::Cancelled)))
            });
        repo.expect_update_booking_status().times(0);
        let test = fixtures::notifier();

        let result = update_booking_status(
            &repo,
            &test.notifier,
            &fixtures::tenant(),
            BookingId::new(1).unwrap(),
            BookingStatus::Confirmed,
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn confirming_emails_the_contact() {
        let mut repo = MockRepository::new();
        repo.expect_get_booking_by_id()
            .returning(|_, _| {
                Ok(Some(fixtures::booking(1, at(5, 9, 0), BookingStatus::Pending)))
            });
        repo.expect_update_booking_status()
            .returning(|_, _, status| Ok(fixtures::booking(1, at(5, 9, 0), status)));
        repo.expect_get_contact_by_id()
            .returning(|_, _| Ok(Some(fixtures::contact(1))));
        repo.expect_list_email_templates().returning(|_| Ok(vec![]));
        repo.expect_get_service_by_id()
            .returning(|_, _| Ok(Some(fixtures::service(1, 60, 10_000))));
        repo.expect_list_subscribed_webhooks()
            .withf(|_, event| *event == WebhookEvent::BookingConfirmed)
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .withf(|_, trigger| *trigger == WorkflowTrigger::BookingConfirmed)
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();

        let booking = update_booking_status(
            &repo,
            &test.notifier,
            &fixtures::tenant(),
            BookingId::new(1).unwrap(),
            BookingStatus::Confirmed,
        )
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        let sent = test.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada1@example.com");
        assert_eq!(sent[0].subject, "Your booking with Bright Smile is confirmed");
        assert!(sent[0].html.contains("Service 1"));
    }

    #[test]
    fn finished_bookings_cannot_be_edited() {
        let mut repo = MockRepository::new();
        repo.expect_get_booking_by_id()
            .returning(|_, _| {
                Ok(Some(fixtures::booking(1, at(5, 9, 0), BookingStatus::Completed)))
            });
        repo.expect_update_booking().times(0);
        let test = fixtures::notifier();

        let result = update_booking(
            &repo,
            &test.notifier,
            &fixtures::tenant(),
            BookingId::new(1).unwrap(),
            payload("2026-01-06T09:00"),
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
