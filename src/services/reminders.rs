//! Day-before booking reminders, driven by the cron endpoint and `run_jobs`.
//!
//! Bookings are scheduled in tenant-local time; reminder `send_at` values
//! are stored in UTC so one query finds the due reminders of every tenant.

use chrono::{DateTime, Duration, Utc};

use crate::domain::reminder::{BookingReminder, NewBookingReminder, ReminderStatus};
use crate::domain::tenant::Tenant;
use crate::dto::jobs::ReminderJobReport;
use crate::email::BOOKING_REMINDER;
use crate::repository::{
    BookingReader, ContactReader, EmailTemplateReader, PackageReader, ReminderReader,
    ReminderWriter, ServiceReader, TenantReader,
};
use crate::services::bookings::send_booking_email;
use crate::services::{Notifier, ServiceResult};

/// How far ahead bookings are picked up for reminders.
const SCHEDULE_HORIZON_HOURS: i64 = 48;
/// Reminders go out this long before the appointment.
const REMIND_BEFORE_HOURS: i64 = 24;
const BATCH_SIZE: i64 = 100;

/// Everything the reminder jobs read and write.
pub trait ReminderStore:
    TenantReader
    + BookingReader
    + ContactReader
    + ServiceReader
    + PackageReader
    + EmailTemplateReader
    + ReminderReader
    + ReminderWriter
{
}

impl<T> ReminderStore for T where
    T: TenantReader
        + BookingReader
        + ContactReader
        + ServiceReader
        + PackageReader
        + EmailTemplateReader
        + ReminderReader
        + ReminderWriter
        + ?Sized
{
}

fn schedule_for_tenant<R>(repo: &R, tenant: &Tenant, now: DateTime<Utc>) -> ServiceResult<usize>
where
    R: ReminderStore + ?Sized,
{
    let local_now = tenant.local_time(now);
    let bookings = repo.list_bookings_without_reminder(
        tenant.id,
        local_now,
        local_now + Duration::hours(SCHEDULE_HORIZON_HOURS),
    )?;
    let mut scheduled = 0;
    for booking in bookings {
        let remind_at = booking.scheduled_at - Duration::hours(REMIND_BEFORE_HOURS);
        if remind_at <= local_now {
            continue;
        }
        match repo.create_reminder(&NewBookingReminder {
            booking_id: booking.id,
            tenant_id: booking.tenant_id,
            send_at: tenant.to_utc(remind_at),
        }) {
            Ok(_) => scheduled += 1,
            Err(e) => log::error!("Failed to schedule reminder for booking {}: {e}", booking.id),
        }
    }
    Ok(scheduled)
}

/// Creates a reminder for each confirmed booking in the next 48 hours of its
/// tenant's calendar that has none. Bookings whose reminder time has already
/// passed get none.
pub fn schedule_booking_reminders<R>(repo: &R, now: DateTime<Utc>) -> ServiceResult<usize>
where
    R: ReminderStore + ?Sized,
{
    let mut scheduled = 0;
    for tenant in repo.list_tenants()? {
        match schedule_for_tenant(repo, &tenant, now) {
            Ok(count) => scheduled += count,
            Err(e) => log::error!("Failed to schedule reminders for tenant {}: {e}", tenant.id),
        }
    }
    Ok(scheduled)
}

fn deliver<R>(
    repo: &R,
    notifier: &Notifier,
    reminder: &BookingReminder,
    now: DateTime<Utc>,
) -> ServiceResult<(ReminderStatus, Option<String>)>
where
    R: ReminderStore + ?Sized,
{
    let Some(booking) = repo.get_booking_by_id(reminder.booking_id, reminder.tenant_id)? else {
        return Ok((ReminderStatus::Skipped, Some("Booking no longer exists".to_string())));
    };
    let Some(tenant) = repo.get_tenant_by_id(reminder.tenant_id)? else {
        return Ok((ReminderStatus::Skipped, Some("Business no longer exists".to_string())));
    };
    if !booking.status.is_active() || booking.scheduled_at <= tenant.local_time(now) {
        return Ok((ReminderStatus::Skipped, None));
    }
    if send_booking_email(repo, notifier, &tenant, &booking, &BOOKING_REMINDER) {
        Ok((ReminderStatus::Sent, None))
    } else {
        Ok((ReminderStatus::Failed, Some("Email could not be sent".to_string())))
    }
}

/// Sends every pending reminder that is due. Reminders of bookings that
/// were cancelled or already took place are skipped.
pub fn send_due_reminders<R>(
    repo: &R,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> ServiceResult<ReminderJobReport>
where
    R: ReminderStore + ?Sized,
{
    let mut report = ReminderJobReport {
        scheduled: schedule_booking_reminders(repo, now)?,
        ..ReminderJobReport::default()
    };

    for reminder in repo.list_due_reminders(now.naive_utc(), BATCH_SIZE)? {
        let (status, error) = deliver(repo, notifier, &reminder, now)
            .unwrap_or_else(|e| (ReminderStatus::Failed, Some(e.to_string())));
        match status {
            ReminderStatus::Sent => report.sent += 1,
            ReminderStatus::Skipped => report.skipped += 1,
            _ => report.failed += 1,
        }
        let sent_at = (status == ReminderStatus::Sent).then_some(now.naive_utc());
        if let Err(e) = repo.mark_reminder(reminder.id, status, sent_at, error) {
            log::error!("Failed to update reminder {}: {e}", reminder.id);
        }
    }

    if report != ReminderJobReport::default() {
        log::info!(
            "Reminders: {} scheduled, {} sent, {} skipped, {} failed",
            report.scheduled,
            report.sent,
            report.skipped,
            report.failed
        );
    }
    Ok(report)
}
