//! Numbering error types.
//!
//! Failures abort the operation; see [`NumberingWarning`](super::types::NumberingWarning)
//! for conditions that are reported but never abort.

use thiserror::Error;

/// Errors that can occur while allocating, previewing, configuring or
/// resetting a sequence.
#[derive(Debug, Error)]
pub enum NumberingError {
    /// No sequence exists for the requested key.
    #[error("Sequence {0} not found")]
    NotFound(String),

    /// The sequence is disabled and refuses allocation.
    #[error("Sequence {0} is inactive")]
    Inactive(String),

    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("Sequence {document_type} is contended: gave up after {attempts} attempts")]
    Contention {
        /// The contended sequence.
        document_type: String,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The backing store could not be reached or failed mid-operation.
    #[error("Sequence store unavailable: {0}")]
    StoreUnavailable(String),

    /// The request or stored configuration is not usable.
    #[error("Invalid sequence configuration: {0}")]
    InvalidConfig(String),

    /// A reset was requested without acknowledging that it cannot be undone.
    #[error("Resetting sequence {0} requires explicit acknowledgement")]
    ConfirmationRequired(String),
}

impl NumberingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidConfig(_) | Self::ConfirmationRequired(_) => 400,
            Self::NotFound(_) => 404,
            Self::Inactive(_) | Self::Contention { .. } => 409,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "sequence_not_found",
            Self::Inactive(_) => "sequence_inactive",
            Self::Contention { .. } => "sequence_contention",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::InvalidConfig(_) => "invalid_config",
            Self::ConfirmationRequired(_) => "confirmation_required",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Contention { .. } | Self::StoreUnavailable(_))
    }
}
