//! Sign-up form.
//!
//! A successful sign-up assigns a generated codename as the display name
//! and publishes a profile so other members can pick the new user as an
//! assignee. The profile write is best-effort.

use std::sync::Arc;

use tracing::{info, warn};

use super::{FormError, FormPhase};
use crate::domain::auth::{Credentials, sign_up_message};
use crate::domain::codename::generate_codename;
use crate::domain::document::USERS_COLLECTION;
use crate::domain::ports::{AuthProvider, AuthProviderError, DocumentStore, Navigator};
use crate::domain::validation::FieldErrors;
use crate::domain::{ErrorCode, Route, User, UserProfile};

/// Email/password account creation.
pub struct SignupForm {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    navigator: Arc<dyn Navigator>,
    errors: FieldErrors,
    phase: FormPhase,
}

impl SignupForm {
    /// Form creating accounts through `provider` and publishing profiles
    /// to `store`.
    #[must_use]
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            provider,
            store,
            navigator,
            errors: FieldErrors::default(),
            phase: FormPhase::Editing,
        }
    }

    /// Field messages from the last attempt.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Validate, create the account, assign a codename and navigate to
    /// `/heists`.
    pub async fn submit(&mut self, email: &str, password: &str) -> Result<User, FormError> {
        if self.phase != FormPhase::Editing {
            return Err(FormError::general(ErrorCode::Conflict, "Submission in progress"));
        }
        let credentials = match Credentials::for_sign_up(email, password) {
            Ok(credentials) => credentials,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(FormError::Invalid(errors));
            }
        };
        self.errors = FieldErrors::default();

        self.phase = FormPhase::Submitting;
        let user = match self.register(&credentials).await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "sign-up failed");
                self.phase = FormPhase::Editing;
                let (field, message) = sign_up_message(err.code().as_ref());
                let failure = FormError::field(field, message);
                if let FormError::Invalid(errors) = &failure {
                    self.errors = errors.clone();
                }
                return Err(failure);
            }
        };

        self.publish_profile(&user).await;
        self.phase = FormPhase::Redirecting;
        self.navigator.push(Route::Heists);
        Ok(user)
    }

    async fn register(&self, credentials: &Credentials) -> Result<User, AuthProviderError> {
        let mut user = self.provider.sign_up(credentials).await?;
        let codename = generate_codename();
        self.provider.set_display_name(&codename).await?;
        info!(user_id = %user.id, codename = %codename, "account created");
        user.display_name = Some(codename);
        Ok(user)
    }

    async fn publish_profile(&self, user: &User) {
        let Some(codename) = user.display_name.clone() else {
            return;
        };
        let profile = UserProfile {
            id: user.id.clone(),
            codename,
        };
        if let Err(err) = self
            .store
            .set_document(USERS_COLLECTION, user.id.as_str(), profile.to_fields())
            .await
        {
            warn!(error = %err, user_id = %user.id, "failed to write user profile");
        }
    }
}
