//! # Validation Errors
//!
//! Failures detected on the client side before any request leaves the
//! process. Every variant is recoverable: the triggering action is refused
//! and nothing is written.

use thiserror::Error;

use crate::entity::TagKind;

/// A record or action failed a local precondition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Column name of the offending field.
        field: &'static str,
    },

    /// Deleting the tag would leave the company with no tag of this kind.
    #[error("cannot delete the last {kind} of a company")]
    LastTagOfKind {
        /// Kind of tag whose deletion was refused.
        kind: TagKind,
    },

    /// A foreign key points at a row owned by a different company, or at
    /// no row at all.
    #[error("{field} does not reference a record of the same company")]
    CrossCompanyReference {
        /// Column name of the offending foreign key.
        field: &'static str,
    },

    /// A navigation return URL is not a local path.
    #[error("return URL must be a local path: \"{0}\"")]
    InvalidReturnUrl(String),
}

/// Reject empty or whitespace-only required text.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank() {
        assert_eq!(
            require("name", "   "),
            Err(ValidationError::EmptyField { field: "name" })
        );
        assert!(require("name", "Acme").is_ok());
    }

    #[test]
    fn messages_name_the_field() {
        let err = ValidationError::CrossCompanyReference { field: "id_domain" };
        assert!(err.to_string().contains("id_domain"));
        let err = ValidationError::LastTagOfKind {
            kind: TagKind::Market,
        };
        assert_eq!(err.to_string(), "cannot delete the last market of a company");
    }
}
