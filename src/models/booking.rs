use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::booking::{
    Booking as DomainBooking, BookingPaymentUpdate, NewBooking as DomainNewBooking,
    UpdateBooking as DomainUpdateBooking,
};
use crate::domain::types::{
    BookingId, ContactId, PackageId, ServiceId, TenantId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bookings)]
/// Diesel model for [`crate::domain::booking::Booking`].
pub struct Booking {
    pub id: i32,
    pub tenant_id: i32,
    pub contact_id: i32,
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
    pub public_id: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub status: String,
    pub payment_status: String,
    pub amount_paid_cents: i32,
    pub deposit_allocated_cents: i32,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking<'a> {
    pub tenant_id: i32,
    pub contact_id: i32,
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
    pub public_id: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub status: &'a str,
    pub notes: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::bookings)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateBooking<'a> {
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::bookings)]
pub struct UpdateBookingPayment<'a> {
    pub amount_paid_cents: i32,
    pub deposit_allocated_cents: i32,
    pub payment_status: &'a str,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Booking> for DomainBooking {
    type Error = TypeConstraintError;

    fn try_from(booking: Booking) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BookingId::try_from(booking.id)?,
            tenant_id: TenantId::try_from(booking.tenant_id)?,
            contact_id: ContactId::try_from(booking.contact_id)?,
            service_id: booking.service_id.map(ServiceId::try_from).transpose()?,
            package_id: booking.package_id.map(PackageId::try_from).transpose()?,
            public_id: booking.public_id.parse()?,
            scheduled_at: booking.scheduled_at,
            duration_minutes: booking.duration_minutes,
            total_price_cents: booking.total_price_cents,
            status: booking.status.parse()?,
            payment_status: booking.payment_status.parse()?,
            amount_paid_cents: booking.amount_paid_cents,
            deposit_allocated_cents: booking.deposit_allocated_cents,
            notes: booking.notes,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewBooking> for NewBooking<'a> {
    fn from(booking: &'a DomainNewBooking) -> Self {
        Self {
            tenant_id: booking.tenant_id.get(),
            contact_id: booking.contact_id.get(),
            service_id: booking.service_id.map(|id| id.get()),
            package_id: booking.package_id.map(|id| id.get()),
            public_id: booking.public_id.to_string(),
            scheduled_at: booking.scheduled_at,
            duration_minutes: booking.duration_minutes,
            total_price_cents: booking.total_price_cents,
            status: booking.status.as_str(),
            notes: booking.notes.as_deref(),
        }
    }
}

impl<'a> From<&'a DomainUpdateBooking> for UpdateBooking<'a> {
    fn from(booking: &'a DomainUpdateBooking) -> Self {
        Self {
            service_id: booking.service_id.map(|id| id.get()),
            package_id: booking.package_id.map(|id| id.get()),
            scheduled_at: booking.scheduled_at,
            duration_minutes: booking.duration_minutes,
            total_price_cents: booking.total_price_cents,
            notes: booking.notes.as_deref(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl<'a> From<&'a BookingPaymentUpdate> for UpdateBookingPayment<'a> {
    fn from(update: &'a BookingPaymentUpdate) -> Self {
        Self {
            amount_paid_cents: update.amount_paid_cents,
            deposit_allocated_cents: update.deposit_allocated_cents,
            payment_status: update.payment_status.as_str(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingPaymentStatus, BookingStatus};
    use crate::domain::types::PublicId;

    #[test]
    fn row_converts_into_domain() {
        let now = chrono::Utc::now().naive_utc();
        let public_id = PublicId::new();
        let row = Booking {
            id: 9,
            tenant_id: 1,
            contact_id: 2,
            service_id: Some(4),
            package_id: None,
            public_id: public_id.to_string(),
            scheduled_at: now,
            duration_minutes: 45,
            total_price_cents: 7_500,
            status: "no_show".to_string(),
            payment_status: "deposit_paid".to_string(),
            amount_paid_cents: 2_000,
            deposit_allocated_cents: 2_000,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let booking = DomainBooking::try_from(row).unwrap();
        assert_eq!(booking.public_id, public_id);
        assert_eq!(booking.status, BookingStatus::NoShow);
        assert_eq!(booking.payment_status, BookingPaymentStatus::DepositPaid);
        assert_eq!(booking.balance_due_cents(), 5_500);
    }
}
