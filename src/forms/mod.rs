//! JSON request payloads and their conversion into domain values.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod api_key;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod contact;
pub mod email_template;
pub mod invoice;
pub mod payment;
pub mod public;
pub mod tag;
pub mod tenant;
pub mod webhook;
pub mod workflow;

#[derive(Debug, Error)]
/// Errors that can occur when processing request payloads.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Constraint(#[from] TypeConstraintError),

    #[error("invalid CSV: {0}")]
    Csv(String),

    #[error("{0}")]
    Invalid(String),
}

/// Trims free text, strips unsafe markup and drops empty values.
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| ammonia::clean(v.trim()))
        .filter(|v| !v.is_empty())
}

/// Trims and drops empty values without touching the content.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_scripts_and_blanks() {
        assert_eq!(
            clean_text(Some(" <script>x</script>Hi ".to_string())),
            Some("Hi".to_string())
        );
        assert_eq!(clean_text(Some("   ".to_string())), None);
        assert_eq!(trimmed(Some(" a ".to_string())), Some("a".to_string()));
    }
}
