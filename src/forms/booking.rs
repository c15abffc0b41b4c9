use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use validator::Validate;

use crate::domain::booking::BookingStatus;
use crate::domain::types::{ContactId, PackageId, ServiceId};
use crate::forms::{FormError, clean_text};

/// Accepts `YYYY-MM-DDTHH:MM[:SS]` and the same with a space separator.
pub fn parse_local_datetime(value: &str) -> Result<NaiveDateTime, FormError> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| FormError::Invalid(format!("invalid date and time `{value}`")))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| FormError::Invalid(format!("invalid date `{value}` (YYYY-MM-DD)")))
}

/// What a booking reserves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingItem {
    Service(ServiceId),
    Package(PackageId),
}

pub(crate) fn booking_item(
    service_id: Option<i32>,
    package_id: Option<i32>,
) -> Result<BookingItem, FormError> {
    match (service_id, package_id) {
        (Some(id), None) => Ok(BookingItem::Service(ServiceId::new(id)?)),
        (None, Some(id)) => Ok(BookingItem::Package(PackageId::new(id)?)),
        _ => Err(FormError::Invalid(
            "exactly one of service_id or package_id is required".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BookingPayload {
    pub contact_id: i32,
    pub service_id: Option<i32>,
    pub package_id: Option<i32>,
    pub scheduled_at: String,
    /// Overrides the duration of the booked service or package.
    #[validate(range(min = 5, max = 1440))]
    pub duration_minutes: Option<i32>,
    /// Overrides the price of the booked service or package.
    #[validate(range(min = 0))]
    pub total_price_cents: Option<i32>,
    pub status: Option<BookingStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Validated booking request; pricing is completed by the service layer.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingDraft {
    pub contact_id: ContactId,
    pub item: BookingItem,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: Option<i32>,
    pub total_price_cents: Option<i32>,
    pub status: BookingStatus,
    pub notes: Option<String>,
}

impl BookingPayload {
    pub fn into_draft(self) -> Result<BookingDraft, FormError> {
        self.validate()?;
        let status = self.status.unwrap_or(BookingStatus::Pending);
        if !status.is_active() {
            return Err(FormError::Invalid(format!(
                "new bookings cannot start as `{status}`"
            )));
        }
        Ok(BookingDraft {
            contact_id: ContactId::new(self.contact_id)?,
            item: booking_item(self.service_id, self.package_id)?,
            scheduled_at: parse_local_datetime(&self.scheduled_at)?,
            duration_minutes: self.duration_minutes,
            total_price_cents: self.total_price_cents,
            status,
            notes: clean_text(self.notes),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusPayload {
    pub status: BookingStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    pub contact_id: Option<i32>,
    pub status: Option<BookingStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl BookingListParams {
    /// `from`/`to` accept either a date or a date and time.
    pub fn range(&self) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), FormError> {
        let parse = |value: &Option<String>, end_of_day: bool| -> Result<_, FormError> {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) if v.len() == 10 => {
                    let date = parse_date(v)?;
                    let date = if end_of_day { date.succ_opt().unwrap_or(date) } else { date };
                    Ok(date.and_hms_opt(0, 0, 0))
                }
                Some(v) => parse_local_datetime(v).map(Some),
            }
        };
        Ok((parse(&self.from, false)?, parse(&self.to, true)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> BookingPayload {
        BookingPayload {
            contact_id: 1,
            service_id: Some(2),
            package_id: None,
            scheduled_at: "2026-01-05T09:30".to_string(),
            duration_minutes: None,
            total_price_cents: None,
            status: None,
            notes: None,
        }
    }

    #[test]
    fn draft_defaults_to_pending_service_booking() {
        let draft = payload().into_draft().unwrap();
        assert_eq!(draft.status, BookingStatus::Pending);
        assert_eq!(draft.item, BookingItem::Service(ServiceId::new(2).unwrap()));
        assert_eq!(draft.scheduled_at.to_string(), "2026-01-05 09:30:00");
    }

    #[test]
    fn requires_exactly_one_item() {
        let mut both = payload();
        both.package_id = Some(4);
        assert!(matches!(both.into_draft(), Err(FormError::Invalid(_))));

        let mut neither = payload();
        neither.service_id = None;
        assert!(neither.into_draft().is_err());
    }

    #[test]
    fn rejects_terminal_initial_status() {
        let mut done = payload();
        done.status = Some(BookingStatus::Completed);
        assert!(done.into_draft().is_err());
    }

    #[test]
    fn date_only_range_covers_whole_days() {
        let params = BookingListParams {
            from: Some("2026-01-05".to_string()),
            to: Some("2026-01-05".to_string()),
            ..BookingListParams::default()
        };
        let (from, to) = params.range().unwrap();
        assert_eq!(from.unwrap().to_string(), "2026-01-05 00:00:00");
        assert_eq!(to.unwrap().to_string(), "2026-01-06 00:00:00");
    }
}
