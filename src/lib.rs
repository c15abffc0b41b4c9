//! Booking, CRM and invoicing backend for small service businesses.

#[cfg(feature = "server")]
mod app;
#[cfg(feature = "server")]
pub mod auth;
pub mod billing;
pub mod db;
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod email;
pub mod error_conversions;
pub mod formatters;
#[cfg(feature = "server")]
pub mod forms;
pub mod models;
pub mod pagination;
#[cfg(feature = "server")]
pub mod ratelimit;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod schedule;
pub mod schema;
#[cfg(feature = "server")]
pub mod services;
#[cfg(feature = "server")]
pub mod webhooks;

#[cfg(feature = "server")]
pub use app::{build_notifier, run};
