use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::reminder::{BookingReminder, NewBookingReminder, ReminderStatus};
use crate::domain::types::{ReminderId, TenantId};
use crate::models::booking::Booking as DbBooking;
use crate::models::reminder::{
    BookingReminder as DbReminder, NewBookingReminder as DbNewReminder,
};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, ReminderReader, ReminderWriter};
use crate::schema::{booking_reminders, bookings};

impl ReminderReader for DieselRepository {
    fn list_bookings_without_reminder(
        &self,
        tenant_id: TenantId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<Booking>> {
        let mut conn = self.conn()?;
        let reminded = booking_reminders::table.select(booking_reminders::booking_id);
        let rows = bookings::table
            .filter(bookings::tenant_id.eq(tenant_id.get()))
            .filter(bookings::status.eq(BookingStatus::Confirmed.as_str()))
            .filter(bookings::scheduled_at.ge(from))
            .filter(bookings::scheduled_at.lt(to))
            .filter(diesel::dsl::not(bookings::id.eq_any(reminded)))
            .order(bookings::scheduled_at.asc())
            .load::<DbBooking>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn list_due_reminders(
        &self,
        now: NaiveDateTime,
        limit: i64,
    ) -> RepositoryResult<Vec<BookingReminder>> {
        let mut conn = self.conn()?;
        let rows = booking_reminders::table
            .filter(booking_reminders::status.eq(ReminderStatus::Pending.as_str()))
            .filter(booking_reminders::send_at.le(now))
            .order(booking_reminders::send_at.asc())
            .limit(limit)
            .load::<DbReminder>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(BookingReminder::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ReminderWriter for DieselRepository {
    fn create_reminder(&self, reminder: &NewBookingReminder) -> RepositoryResult<BookingReminder> {
        let mut conn = self.conn()?;
        let insertable: DbNewReminder = reminder.into();
        let created = diesel::insert_into(booking_reminders::table)
            .values(&insertable)
            .get_result::<DbReminder>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn mark_reminder(
        &self,
        id: ReminderId,
        status: ReminderStatus,
        sent_at: Option<NaiveDateTime>,
        error: Option<String>,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(booking_reminders::table.find(id.get()))
            .set((
                booking_reminders::status.eq(status.as_str()),
                booking_reminders::sent_at.eq(sent_at),
                booking_reminders::error.eq(error),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}
