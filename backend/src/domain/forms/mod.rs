//! Forms: synchronous validation followed by a single write.
//!
//! Every form moves through [`FormPhase::Editing`],
//! [`FormPhase::Submitting`] and, on success, [`FormPhase::Redirecting`].
//! Validation runs synchronously before any port call. A failed write
//! records a message and returns the form to editing; nothing is retried.

mod autosave;
mod create_heist;
mod login;
mod signup;

pub use autosave::{AUTOSAVE_DELAY, DRAFT_KEY, DraftAutosave, HeistDraft};
pub use create_heist::{Assignees, CreateHeistForm, load_assignees};
pub use login::LoginForm;
pub use signup::SignupForm;

use super::validation::FieldErrors;
use super::{Error, ErrorCode};

/// Lifecycle of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    /// Accepting input.
    #[default]
    Editing,
    /// Waiting for the write to complete; input is disabled.
    Submitting,
    /// The write succeeded and navigation was requested.
    Redirecting,
}

/// Why a submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// One or more fields are invalid.
    #[error("validation failed")]
    Invalid(FieldErrors),
    /// A form-level message.
    #[error("{message}")]
    General {
        /// Category used by transport adapters.
        code: ErrorCode,
        /// Message shown above the form.
        message: &'static str,
    },
}

impl FormError {
    fn general(code: ErrorCode, message: &'static str) -> Self {
        Self::General { code, message }
    }

    fn field(field: &'static str, message: &'static str) -> Self {
        let mut errors = FieldErrors::default();
        errors.insert(field, message);
        Self::Invalid(errors)
    }
}

impl From<FormError> for Error {
    fn from(value: FormError) -> Self {
        match value {
            FormError::Invalid(errors) => errors.into(),
            FormError::General { code, message } => Error::new(code, message),
        }
    }
}
