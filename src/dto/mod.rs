//! Response shapes returned by the JSON API that combine several domain
//! records.

pub mod api_key;
pub mod catalog;
pub mod contact;
pub mod invoice;
pub mod jobs;
pub mod public;
pub mod webhook;
pub mod workflow;

use serde::Serialize;

/// Acknowledgement body for deletes and other bodiless operations.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub const OK: Success = Success { success: true };
}
