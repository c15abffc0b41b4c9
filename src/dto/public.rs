//! Views served to the unauthenticated booking widget.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::booking::BookingStatus;
use crate::domain::catalog::Service;
use crate::domain::tenant::Tenant;
use crate::domain::types::{ContactId, PublicId};
use crate::dto::catalog::PackageView;
use crate::schedule::DayAvailability;

#[derive(Debug, Serialize)]
pub struct PublicTenant {
    pub name: String,
    pub slug: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub timezone: String,
    pub slot_interval: i32,
    pub services: Vec<Service>,
    pub packages: Vec<PackageView>,
}

impl PublicTenant {
    pub fn new(tenant: Tenant, services: Vec<Service>, packages: Vec<PackageView>) -> Self {
        Self {
            name: tenant.name.into_inner(),
            slug: tenant.slug.into_inner(),
            email: tenant.email,
            phone: tenant.business_phone,
            address: tenant.business_address,
            website: tenant.business_website,
            timezone: tenant.timezone,
            slot_interval: tenant.slot_interval,
            services,
            packages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicAvailability {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub hours: DayAvailability,
    /// Start times as `HH:MM`.
    pub slots: Vec<String>,
}

/// Booking as shown to the contact through its token.
#[derive(Debug, Serialize)]
pub struct PublicBooking {
    pub token: PublicId,
    pub confirmation_number: String,
    pub business_name: String,
    pub item_name: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_price_cents: i32,
    pub status: BookingStatus,
    pub can_cancel: bool,
}

#[derive(Debug, Serialize)]
pub struct PublicLeadContact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
}

/// Outcome of saving a lead from the widget.
#[derive(Debug, Serialize)]
pub struct PublicLead {
    pub contact: PublicLeadContact,
    pub is_new_contact: bool,
    pub message: String,
}
