//! Errors surfaced by projects-screen actions.

use thiserror::Error;
use vigil_core::ServiceError;

/// Client-side validation failures of the create-project form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CreateProjectError {
    /// A required field is empty.
    #[error("{field} is required")]
    MissingField {
        /// Offending field.
        field: &'static str,
    },
    /// The display name exceeds the maximum length.
    #[error("display name exceeds {max} characters")]
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The key exceeds the maximum length.
    #[error("project key exceeds {max} characters")]
    KeyTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The key contains characters outside `[A-Za-z0-9_.:-]`.
    #[error("project key contains invalid characters")]
    KeyInvalidCharacters,
    /// The key is made of digits only.
    #[error("project key must contain at least one non-digit character")]
    KeyAllDigits,
}

impl CreateProjectError {
    /// Translation key describing the failure.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::MissingField { .. } => "create_project.errors.missing_field",
            Self::NameTooLong { .. } => "create_project.errors.name_too_long",
            Self::KeyTooLong { .. } => "create_project.errors.key_too_long",
            Self::KeyInvalidCharacters => "create_project.errors.key_invalid_characters",
            Self::KeyAllDigits => "create_project.errors.key_all_digits",
        }
    }
}

/// Failure of a screen action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The create-project form is invalid; nothing was sent.
    #[error("invalid project")]
    InvalidProject(#[from] CreateProjectError),
    /// A dialog cannot be submitted in its current state.
    #[error("{reason}")]
    Validation {
        /// Why submission was blocked.
        reason: &'static str,
    },
    /// The action is not offered to the current user.
    #[error("action not permitted")]
    PermissionDenied {
        /// Action identifier.
        action: &'static str,
    },
    /// No dialog of the expected kind is open.
    #[error("no {expected} dialog is open")]
    NoDialog {
        /// Dialog kind the action targets.
        expected: &'static str,
    },
    /// The referenced project is not on screen.
    #[error("project is not listed")]
    UnknownProject,
    /// The backend facade failed.
    #[error(transparent)]
    Backend(#[from] ServiceError),
    /// A newer request superseded this one; the response was discarded.
    #[error("stale response discarded")]
    Stale {
        /// Sequence number of the discarded request.
        sequence: u64,
    },
}

impl ActionError {
    /// Whether the failure should be hidden from the user.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}
