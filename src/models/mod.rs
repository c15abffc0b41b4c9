//! Diesel models mirroring the database tables.

pub mod api_key;
pub mod availability;
pub mod booking;
pub mod catalog;
#[cfg(feature = "server")]
pub mod config;
pub mod contact;
pub mod email_template;
pub mod invoice;
pub mod payment;
pub mod reminder;
pub mod tag;
pub mod tenant;
pub mod webhook;
pub mod workflow;
