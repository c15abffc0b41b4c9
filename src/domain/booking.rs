use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{
    BookingId, ContactId, PackageId, PublicId, ServiceId, TenantId, text_enum,
};

text_enum!(
    /// Lifecycle status of a booking.
    BookingStatus {
        Inquiry => "inquiry",
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
);

impl BookingStatus {
    /// Statuses that occupy a slot on the calendar.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Inquiry,
        BookingStatus::Pending,
        BookingStatus::Confirmed,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether moving from `self` to `next` is allowed. Re-applying the current
    /// status is always accepted as a no-op.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        if self == next {
            return true;
        }
        match self {
            BookingStatus::Inquiry | BookingStatus::Pending => {
                matches!(next, BookingStatus::Confirmed | BookingStatus::Cancelled)
            }
            BookingStatus::Confirmed => matches!(
                next,
                BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
            ),
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow => false,
        }
    }
}

text_enum!(
    /// Payment progress of a single booking.
    BookingPaymentStatus {
        Unpaid => "unpaid",
        DepositPaid => "deposit_paid",
        Paid => "paid",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub tenant_id: TenantId,
    pub contact_id: ContactId,
    pub service_id: Option<ServiceId>,
    pub package_id: Option<PackageId>,
    pub public_id: PublicId,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub amount_paid_cents: i32,
    pub deposit_allocated_cents: i32,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn balance_due_cents(&self) -> i32 {
        (self.total_price_cents - self.amount_paid_cents).max(0)
    }
}

#[derive(Clone, Debug)]
pub struct NewBooking {
    pub tenant_id: TenantId,
    pub contact_id: ContactId,
    pub service_id: Option<ServiceId>,
    pub package_id: Option<PackageId>,
    pub public_id: PublicId,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub status: BookingStatus,
    pub notes: Option<String>,
}

/// Editable booking details; status changes go through their own operation.
#[derive(Clone, Debug)]
pub struct UpdateBooking {
    pub service_id: Option<ServiceId>,
    pub package_id: Option<PackageId>,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub notes: Option<String>,
}

/// Payment bookkeeping written back to a booking after an allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingPaymentUpdate {
    pub booking_id: BookingId,
    pub amount_paid_cents: i32,
    pub deposit_allocated_cents: i32,
    pub payment_status: BookingPaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;

    #[test]
    fn open_bookings_can_be_confirmed_or_cancelled() {
        assert!(Inquiry.can_transition_to(Confirmed));
        assert!(Inquiry.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(!Inquiry.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(NoShow));
    }

    #[test]
    fn confirmed_bookings_can_finish() {
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Inquiry));
    }

    #[test]
    fn terminal_statuses_are_final() {
        for status in [Completed, Cancelled, NoShow] {
            assert!(status.is_terminal());
            assert!(!status.can_transition_to(Confirmed));
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn active_statuses_occupy_slots() {
        assert!(Inquiry.is_active());
        assert!(Confirmed.is_active());
        assert!(!Cancelled.is_active());
        assert_eq!("no_show".parse::<super::BookingStatus>().unwrap(), NoShow);
    }
}
