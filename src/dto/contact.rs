use serde::Serialize;

use crate::domain::contact::Contact;
use crate::domain::tag::Tag;
use crate::forms::contact::ImportRowError;

#[derive(Debug, Serialize)]
pub struct ContactDetail {
    #[serde(flatten)]
    pub contact: Contact,
    pub tags: Vec<Tag>,
}

/// Outcome of a CSV import.
#[derive(Debug, Serialize, PartialEq)]
pub struct ImportSummary {
    /// Data rows in the file.
    pub total: usize,
    pub imported: usize,
    /// Rows not imported: duplicates and rows with errors.
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
}
