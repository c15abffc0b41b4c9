use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::reminder::{
    BookingReminder as DomainReminder, NewBookingReminder as DomainNewReminder,
};
use crate::domain::types::{BookingId, ReminderId, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::booking_reminders)]
pub struct BookingReminder {
    pub id: i32,
    pub booking_id: i32,
    pub tenant_id: i32,
    pub send_at: NaiveDateTime,
    pub status: String,
    pub sent_at: Option<NaiveDateTime>,
    pub error: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::booking_reminders)]
pub struct NewBookingReminder {
    pub booking_id: i32,
    pub tenant_id: i32,
    pub send_at: NaiveDateTime,
}

impl TryFrom<BookingReminder> for DomainReminder {
    type Error = TypeConstraintError;

    fn try_from(reminder: BookingReminder) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReminderId::try_from(reminder.id)?,
            booking_id: BookingId::try_from(reminder.booking_id)?,
            tenant_id: TenantId::try_from(reminder.tenant_id)?,
            send_at: reminder.send_at,
            status: reminder.status.parse()?,
            sent_at: reminder.sent_at,
            error: reminder.error,
            created_at: reminder.created_at,
        })
    }
}

impl From<&DomainNewReminder> for NewBookingReminder {
    fn from(reminder: &DomainNewReminder) -> Self {
        Self {
            booking_id: reminder.booking_id.get(),
            tenant_id: reminder.tenant_id.get(),
            send_at: reminder.send_at,
        }
    }
}
