use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{BookingId, ReminderId, TenantId, text_enum};

text_enum!(
    ReminderStatus {
        Pending => "pending",
        Sent => "sent",
        Skipped => "skipped",
        Failed => "failed",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BookingReminder {
    pub id: ReminderId,
    pub booking_id: BookingId,
    pub tenant_id: TenantId,
    pub send_at: NaiveDateTime,
    pub status: ReminderStatus,
    pub sent_at: Option<NaiveDateTime>,
    pub error: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewBookingReminder {
    pub booking_id: BookingId,
    pub tenant_id: TenantId,
    pub send_at: NaiveDateTime,
}
