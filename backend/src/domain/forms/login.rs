//! Sign-in form.

use std::sync::Arc;

use tracing::{info, warn};

use super::{FormError, FormPhase};
use crate::domain::auth::{AuthErrorCode, Credentials, sign_in_message};
use crate::domain::ports::{AuthProvider, AuthProviderError, Navigator};
use crate::domain::validation::FieldErrors;
use crate::domain::{ErrorCode, Route, User};

/// Email/password sign-in.
pub struct LoginForm {
    provider: Arc<dyn AuthProvider>,
    navigator: Arc<dyn Navigator>,
    errors: FieldErrors,
    general: Option<&'static str>,
    phase: FormPhase,
}

impl LoginForm {
    /// Form signing in through `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            provider,
            navigator,
            errors: FieldErrors::default(),
            general: None,
            phase: FormPhase::Editing,
        }
    }

    /// Field messages from the last validation.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Form-level message from the last attempt.
    #[must_use]
    pub fn general_error(&self) -> Option<&'static str> {
        self.general
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Validate and sign in, then navigate to `/heists`.
    pub async fn submit(&mut self, email: &str, password: &str) -> Result<User, FormError> {
        if self.phase != FormPhase::Editing {
            return Err(FormError::general(ErrorCode::Conflict, "Submission in progress"));
        }
        self.general = None;
        let credentials = match Credentials::for_sign_in(email, password) {
            Ok(credentials) => {
                self.errors = FieldErrors::default();
                credentials
            }
            Err(errors) => {
                self.errors = errors.clone();
                return Err(FormError::Invalid(errors));
            }
        };

        self.phase = FormPhase::Submitting;
        match self.provider.sign_in(&credentials).await {
            Ok(user) => {
                info!(user_id = %user.id, "signed in");
                self.phase = FormPhase::Redirecting;
                self.navigator.push(Route::Heists);
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.phase = FormPhase::Editing;
                let code = err.code();
                let message = sign_in_message(code.as_ref());
                self.general = Some(message);
                Err(FormError::general(error_code(&err, code.as_ref()), message))
            }
        }
    }
}

fn error_code(err: &AuthProviderError, code: Option<&AuthErrorCode>) -> ErrorCode {
    match (err, code) {
        (
            _,
            Some(
                AuthErrorCode::InvalidCredential
                | AuthErrorCode::UserNotFound
                | AuthErrorCode::WrongPassword,
            ),
        ) => ErrorCode::Unauthorized,
        (AuthProviderError::Unavailable { .. }, _) | (_, Some(AuthErrorCode::TooManyRequests)) => {
            ErrorCode::ServiceUnavailable
        }
        _ => ErrorCode::InvalidRequest,
    }
}
