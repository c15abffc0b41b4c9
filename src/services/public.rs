//! Unauthenticated booking widget: business profile, open slots,
//! self-service booking and cancellation by token.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::domain::booking::{Booking, BookingStatus, NewBooking};
use crate::domain::contact::{Contact, ContactStatus, NewContact, UpdateContact};
use crate::domain::tag::NewTag;
use crate::domain::tenant::Tenant;
use crate::domain::types::{PublicId, TagName, TenantId};
use crate::domain::webhook::WebhookEvent;
use crate::domain::workflow::{WorkflowSubject, WorkflowTrigger};
use crate::dto::catalog::PackageView;
use crate::dto::public::{
    PublicAvailability, PublicBooking, PublicLead, PublicLeadContact, PublicTenant,
};
use crate::forms::public::{AvailabilityParams, PublicBookingPayload, PublicLeadPayload};
use crate::repository::{AvailabilityReader, TagWriter, TenantReader};
use crate::schedule::{DayAvailability, available_slots};
use crate::services::availability::day_hours;
use crate::services::bookings::{
    after_create, after_status_change, ensure_slot_free, resolve_item,
};
use crate::services::workflows::{WorkflowStore, booking_item_name, trigger_workflows};
use crate::services::{Notifier, ServiceError, ServiceResult, to_payload, utc_now};

fn tenant_by_slug<R>(repo: &R, slug: &str) -> ServiceResult<Tenant>
where
    R: TenantReader + ?Sized,
{
    repo.get_tenant_by_slug(slug)?
        .ok_or_else(|| ServiceError::not_found("Business"))
}

/// Unknown and malformed tokens are both reported as not found.
fn booking_by_token<R>(repo: &R, token: &str) -> ServiceResult<(Booking, Tenant)>
where
    R: WorkflowStore + ?Sized,
{
    let public_id: PublicId = token
        .parse()
        .map_err(|_| ServiceError::not_found("Booking"))?;
    let booking = repo
        .get_booking_by_public_id(public_id)?
        .ok_or_else(|| ServiceError::not_found("Booking"))?;
    let tenant = repo
        .get_tenant_by_id(booking.tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Business"))?;
    Ok((booking, tenant))
}

fn can_cancel(booking: &Booking, now: NaiveDateTime) -> bool {
    booking.status.is_active() && booking.scheduled_at > now
}

fn public_view<R>(repo: &R, tenant: &Tenant, booking: Booking) -> ServiceResult<PublicBooking>
where
    R: WorkflowStore + ?Sized,
{
    Ok(PublicBooking {
        token: booking.public_id,
        confirmation_number: booking.public_id.confirmation_number(),
        business_name: tenant.name.to_string(),
        item_name: booking_item_name(repo, &booking)?,
        scheduled_at: booking.scheduled_at,
        duration_minutes: booking.duration_minutes,
        total_price_cents: booking.total_price_cents,
        status: booking.status,
        can_cancel: can_cancel(&booking, tenant.local_now()),
    })
}

/// Business profile with its active services and packages.
pub fn tenant_profile<R>(repo: &R, slug: &str) -> ServiceResult<PublicTenant>
where
    R: WorkflowStore + ?Sized,
{
    let tenant = tenant_by_slug(repo, slug)?;
    let services = repo.list_services(tenant.id, true)?;
    let packages = repo
        .list_packages(tenant.id, true)?
        .into_iter()
        .map(PackageView::from)
        .collect();
    Ok(PublicTenant::new(tenant, services, packages))
}

/// Open start times on a date. Slots are sized by the selected service or
/// package, or by the slot interval when none is given; past times of the
/// current day are dropped.
pub fn availability<R>(
    repo: &R,
    slug: &str,
    params: AvailabilityParams,
) -> ServiceResult<PublicAvailability>
where
    R: WorkflowStore + AvailabilityReader + ?Sized,
{
    let tenant = tenant_by_slug(repo, slug)?;
    let date = params.date()?;
    let duration = match params.item()? {
        Some(item) => resolve_item(repo, tenant.id, item, true)?.duration_minutes,
        None => tenant.slot_interval,
    };

    let hours = day_hours(repo, tenant.id, date)?;
    let day_start = date.and_time(NaiveTime::MIN);
    let bookings = repo.list_active_bookings_between(
        tenant.id,
        day_start - Duration::days(1),
        day_start + Duration::days(1),
    )?;
    let now = tenant.local_now();
    let slots = available_slots(
        date,
        &hours,
        tenant.slot_interval,
        duration,
        tenant.break_window(),
        &bookings,
    )?
    .into_iter()
    .filter(|slot| *slot > now)
    .map(|slot| slot.format("%H:%M").to_string())
    .collect();

    Ok(PublicAvailability { date, hours, slots })
}

/// Books an appointment as an inquiry. The contact is matched by email or
/// created as a lead.
pub fn book<R>(
    repo: &R,
    notifier: &Notifier,
    slug: &str,
    payload: PublicBookingPayload,
) -> ServiceResult<PublicBooking>
where
    R: WorkflowStore + AvailabilityReader + ?Sized,
{
    let tenant = tenant_by_slug(repo, slug)?;
    let request = payload.into_request()?;
    if request.scheduled_at <= tenant.local_now() {
        return Err(ServiceError::Validation(
            "Please choose a time in the future".to_string(),
        ));
    }
    let item = resolve_item(repo, tenant.id, request.item, true)?;

    let within_hours = match day_hours(repo, tenant.id, request.scheduled_at.date())? {
        DayAvailability::Open { open, close } => {
            let start = request.scheduled_at.time();
            let end = start + Duration::minutes(i64::from(item.duration_minutes));
            start >= open.as_naive() && end <= close.as_naive() && end > start
        }
        DayAvailability::Closed { .. } => false,
    };
    if !within_hours {
        return Err(ServiceError::Validation(
            "The selected time is outside business hours".to_string(),
        ));
    }
    ensure_slot_free(repo, &tenant, request.scheduled_at, item.duration_minutes, None)?;

    let contact = match repo.get_contact_by_email(&request.email, tenant.id)? {
        Some(contact) => contact,
        None => {
            let contact = repo.create_contact(&NewContact {
                tenant_id: tenant.id,
                name: request.name,
                email: request.email,
                phone: request.phone,
                notes: None,
                status: ContactStatus::Lead,
            })?;
            repo.assign_contact_status(tenant.id, contact.id, ContactStatus::Lead)?;
            notifier.webhook(
                repo,
                tenant.id,
                WebhookEvent::ContactCreated,
                to_payload(&contact),
            );
            trigger_workflows(
                repo,
                notifier,
                tenant.id,
                WorkflowTrigger::LeadCreated,
                WorkflowSubject {
                    contact_id: Some(contact.id),
                    ..WorkflowSubject::default()
                },
                utc_now(),
            );
            contact
        }
    };

    let booking = repo
        .create_booking(&NewBooking {
            tenant_id: tenant.id,
            contact_id: contact.id,
            service_id: item.service_id,
            package_id: item.package_id,
            public_id: PublicId::new(),
            scheduled_at: request.scheduled_at,
            duration_minutes: item.duration_minutes,
            total_price_cents: item.price_cents,
            status: BookingStatus::Inquiry,
            notes: request.notes,
        })
        .map_err(|err| {
            log::error!("Failed to create public booking for {slug}: {err}");
            err
        })?;
    log::info!("Public booking {} created for tenant {}", booking.id, tenant.id);

    after_create(repo, notifier, &tenant, &booking);
    public_view(repo, &tenant, booking)
}

/// Tag marking contacts saved from the widget before they booked.
pub const AUTO_SAVED_LEAD_TAG: &str = "Auto-Saved Lead";
const AUTO_SAVED_LEAD_COLOR: &str = "#3b82f6";

fn tag_auto_saved<R>(repo: &R, tenant_id: TenantId, contact: &Contact) -> ServiceResult<()>
where
    R: WorkflowStore + TagWriter + ?Sized,
{
    let existing = repo
        .list_tags(tenant_id)?
        .into_iter()
        .find(|tag| tag.name.as_str().eq_ignore_ascii_case(AUTO_SAVED_LEAD_TAG));
    let tag = match existing {
        Some(tag) => tag,
        None => repo.create_tag(&NewTag {
            tenant_id,
            name: TagName::new(AUTO_SAVED_LEAD_TAG)?,
            color: AUTO_SAVED_LEAD_COLOR.to_string(),
        })?,
    };
    repo.add_contact_tag(contact.id, tag.id)?;
    Ok(())
}

/// Saves the visitor as a lead as soon as they enter their details. Known
/// contacts get their name and phone refreshed; leads and clients keep their
/// status and tags.
pub fn capture_lead<R>(
    repo: &R,
    notifier: &Notifier,
    slug: &str,
    payload: PublicLeadPayload,
) -> ServiceResult<PublicLead>
where
    R: WorkflowStore + TagWriter + ?Sized,
{
    let tenant = tenant_by_slug(repo, slug)?;
    let request = payload.into_request()?;

    let (contact, is_new_contact) = match repo.get_contact_by_email(&request.email, tenant.id)? {
        Some(existing) => {
            let phone = request.phone.or_else(|| existing.phone.clone());
            let contact = if existing.name != request.name || existing.phone != phone {
                repo.update_contact(
                    existing.id,
                    tenant.id,
                    &UpdateContact {
                        name: request.name,
                        email: existing.email.clone(),
                        phone,
                        notes: existing.notes.clone(),
                        status: existing.status,
                    },
                )?
            } else {
                existing
            };
            if contact.status == ContactStatus::Inactive {
                repo.assign_contact_status(tenant.id, contact.id, ContactStatus::Lead)?;
                tag_auto_saved(repo, tenant.id, &contact)?;
            }
            (contact, false)
        }
        None => {
            let contact = repo.create_contact(&NewContact {
                tenant_id: tenant.id,
                name: request.name,
                email: request.email,
                phone: request.phone,
                notes: None,
                status: ContactStatus::Lead,
            })?;
            repo.assign_contact_status(tenant.id, contact.id, ContactStatus::Lead)?;
            tag_auto_saved(repo, tenant.id, &contact)?;
            notifier.webhook(
                repo,
                tenant.id,
                WebhookEvent::ContactCreated,
                to_payload(&contact),
            );
            trigger_workflows(
                repo,
                notifier,
                tenant.id,
                WorkflowTrigger::LeadCreated,
                WorkflowSubject {
                    contact_id: Some(contact.id),
                    ..WorkflowSubject::default()
                },
                utc_now(),
            );
            (contact, true)
        }
    };
    log::info!(
        "Lead {} saved from the widget of tenant {} (new: {is_new_contact})",
        contact.id,
        tenant.id
    );

    Ok(PublicLead {
        contact: PublicLeadContact {
            id: contact.id,
            name: contact.name.to_string(),
            email: contact.email.to_string(),
        },
        is_new_contact,
        message: if is_new_contact {
            "Lead saved successfully".to_string()
        } else {
            "Contact info updated".to_string()
        },
    })
}

pub fn get_booking<R>(repo: &R, token: &str) -> ServiceResult<PublicBooking>
where
    R: WorkflowStore + ?Sized,
{
    let (booking, tenant) = booking_by_token(repo, token)?;
    public_view(repo, &tenant, booking)
}

/// Cancels an upcoming booking on behalf of its contact.
pub fn cancel_booking<R>(repo: &R, notifier: &Notifier, token: &str) -> ServiceResult<PublicBooking>
where
    R: WorkflowStore + ?Sized,
{
    let (booking, tenant) = booking_by_token(repo, token)?;
    if !can_cancel(&booking, tenant.local_now()) {
        return Err(ServiceError::Validation(
            "This booking can no longer be cancelled".to_string(),
        ));
    }
    let booking = repo.update_booking_status(booking.id, tenant.id, BookingStatus::Cancelled)?;
    log::info!("Booking {} cancelled by its contact", booking.id);
    after_status_change(repo, notifier, &tenant, &booking);
    public_view(repo, &tenant, booking)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::availability::WeeklyHours;
    use crate::domain::types::ClockTime;
    use crate::domain::tag::Tag;
    use crate::domain::types::TagId;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures;

    fn future(days: i64, hour: u32) -> NaiveDateTime {
        (chrono::Utc::now().date_naive() + Duration::days(days))
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn open_every_day(repo: &mut MockRepository) {
        repo.expect_list_weekly_hours().returning(|tenant_id| {
            Ok((0..7)
                .map(|day| WeeklyHours {
                    id: day as i32 + 1,
                    tenant_id,
                    day_of_week: day,
                    start_time: ClockTime::parse("09:00").unwrap(),
                    end_time: ClockTime::parse("17:00").unwrap(),
                    active: true,
                })
                .collect())
        });
        repo.expect_get_override_for_date().returning(|_, _| Ok(None));
    }

    fn payload(scheduled_at: NaiveDateTime) -> PublicBookingPayload {
        PublicBookingPayload {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: None,
            service_id: Some(1),
            package_id: None,
            scheduled_at: scheduled_at.format("%Y-%m-%dT%H:%M").to_string(),
            notes: None,
        }
    }

    #[test]
    fn unknown_business_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug().returning(|_| Ok(None));
        assert!(matches!(
            tenant_profile(&repo, "nope"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_tokens_are_not_found() {
        let repo = MockRepository::new();
        assert!(matches!(
            get_booking(&repo, "not-a-uuid"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn slots_skip_booked_times() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_service_by_id()
            .returning(|_, _| Ok(Some(fixtures::service(1, 60, 5_000))));
        open_every_day(&mut repo);
        let day = future(3, 0).date();
        repo.expect_list_active_bookings_between().returning(move |_, _, _| {
            Ok(vec![fixtures::booking(
                1,
                day.and_hms_opt(10, 0, 0).unwrap(),
                BookingStatus::Confirmed,
            )])
        });
        let params = AvailabilityParams {
            date: day.format("%Y-%m-%d").to_string(),
            service_id: Some(1),
            package_id: None,
        };

        let availability = availability(&repo, "bright-smile", params).unwrap();
        assert_eq!(availability.slots.first().map(String::as_str), Some("09:00"));
        assert!(!availability.slots.contains(&"09:30".to_string()));
        assert!(!availability.slots.contains(&"10:30".to_string()));
        assert!(availability.slots.contains(&"11:00".to_string()));
        assert_eq!(availability.slots.last().map(String::as_str), Some("16:00"));
    }

    #[test]
    fn booking_creates_a_lead_and_an_inquiry() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_service_by_id()
            .returning(|_, _| Ok(Some(fixtures::service(1, 60, 5_000))));
        open_every_day(&mut repo);
        repo.expect_list_active_bookings_between()
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_get_contact_by_email().returning(|_, _| Ok(None));
        repo.expect_create_contact()
            .withf(|c| c.status == ContactStatus::Lead && c.email.as_str() == "grace@example.com")
            .times(1)
            .returning(|_| Ok(fixtures::contact(8)));
        repo.expect_assign_contact_status()
            .returning(|_, _, _| Ok(None));
        repo.expect_list_subscribed_webhooks()
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .returning(|_, _| Ok(vec![]));
        repo.expect_create_booking()
            .withf(|b| {
                b.status == BookingStatus::Inquiry
                    && b.contact_id.get() == 8
                    && b.total_price_cents == 5_000
            })
            .times(1)
            .returning(|b| Ok(fixtures::booking(4, b.scheduled_at, b.status)));
        let test = fixtures::notifier();

        let view = book(&repo, &test.notifier, "bright-smile", payload(future(2, 10))).unwrap();
        assert_eq!(view.status, BookingStatus::Inquiry);
        assert_eq!(view.item_name, "Service 1");
        assert!(view.can_cancel);
    }

    #[test]
    fn booking_outside_hours_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_service_by_id()
            .returning(|_, _| Ok(Some(fixtures::service(1, 60, 5_000))));
        open_every_day(&mut repo);
        repo.expect_create_booking().times(0);
        let test = fixtures::notifier();

        let late = future(2, 16) + Duration::minutes(30);
        let result = book(&repo, &test.notifier, "bright-smile", payload(late));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn past_bookings_cannot_be_cancelled() {
        let mut repo = MockRepository::new();
        let booking = fixtures::booking(1, future(-1, 9), BookingStatus::Confirmed);
        let token = booking.public_id.to_string();
        repo.expect_get_booking_by_public_id()
            .returning(move |_| Ok(Some(booking.clone())));
        repo.expect_get_tenant_by_id()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_update_booking_status().times(0);
        let test = fixtures::notifier();

        let result = cancel_booking(&repo, &test.notifier, &token);
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    fn lead(name: &str, email: &str, phone: Option<&str>) -> PublicLeadPayload {
        PublicLeadPayload {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn new_lead_is_created_and_tagged() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_contact_by_email().returning(|_, _| Ok(None));
        repo.expect_create_contact()
            .withf(|c| c.status == ContactStatus::Lead && c.email.as_str() == "grace@example.com")
            .times(1)
            .returning(|_| Ok(fixtures::contact(8)));
        repo.expect_assign_contact_status()
            .withf(|_, _, status| *status == ContactStatus::Lead)
            .times(1)
            .returning(|_, _, _| Ok(None));
        repo.expect_list_tags().returning(|_| Ok(vec![]));
        repo.expect_create_tag()
            .withf(|tag| tag.name.as_str() == AUTO_SAVED_LEAD_TAG)
            .times(1)
            .returning(|new| {
                Ok(Tag {
                    id: TagId::new(5).unwrap(),
                    tenant_id: new.tenant_id,
                    name: new.name.clone(),
                    color: new.color.clone(),
                    created_at: fixtures::now(),
                })
            });
        repo.expect_add_contact_tag()
            .withf(|contact_id, tag_id| contact_id.get() == 8 && tag_id.get() == 5)
            .times(1)
            .returning(|_, _| Ok(true));
        repo.expect_list_subscribed_webhooks()
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_active_workflows()
            .withf(|_, trigger| *trigger == WorkflowTrigger::LeadCreated)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let test = fixtures::notifier();

        let saved = capture_lead(
            &repo,
            &test.notifier,
            "bright-smile",
            lead("Grace Hopper", "Grace@Example.com", None),
        )
        .unwrap();
        assert!(saved.is_new_contact);
        assert_eq!(saved.contact.id.get(), 8);
        assert_eq!(saved.message, "Lead saved successfully");
    }

    #[test]
    fn known_contact_is_refreshed_without_new_tags() {
        let mut repo = MockRepository::new();
        repo.expect_get_tenant_by_slug()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_contact_by_email().returning(|_, _| {
            let mut contact = fixtures::contact(3);
            contact.status = ContactStatus::Client;
            Ok(Some(contact))
        });
        repo.expect_update_contact()
            .withf(|id, _, updates| {
                id.get() == 3
                    && updates.name.as_str() == "Ada King"
                    && updates.phone.as_ref().map(|p| p.as_str()) == Some("+12125550100")
                    && updates.status == ContactStatus::Client
            })
            .times(1)
            .returning(|_, _, updates| {
                let mut contact = fixtures::contact(3);
                contact.name = updates.name.clone();
                contact.phone = updates.phone.clone();
                contact.status = updates.status;
                Ok(contact)
            });
        repo.expect_create_contact().times(0);
        repo.expect_assign_contact_status().times(0);
        repo.expect_add_contact_tag().times(0);
        repo.expect_list_active_workflows().times(0);
        let test = fixtures::notifier();

        let saved = capture_lead(
            &repo,
            &test.notifier,
            "bright-smile",
            lead("Ada King", "ada3@example.com", Some("+12125550100")),
        )
        .unwrap();
        assert!(!saved.is_new_contact);
        assert_eq!(saved.contact.name, "Ada King");
        assert_eq!(saved.message, "Contact info updated");
    }
}
