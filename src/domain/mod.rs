//! Domain entities and value objects shared by the repository, service and
//! HTTP layers.

pub mod api_key;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod contact;
pub mod email_template;
pub mod invoice;
pub mod payment;
pub mod reminder;
pub mod tag;
pub mod tenant;
pub mod types;
pub mod webhook;
pub mod workflow;
