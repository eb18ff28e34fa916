//! Port abstraction for the hosted identity provider.
//!
//! An [`AuthProvider`] is one client session: it pushes the signed-in user
//! (or `None`) to subscribers and performs sign-in, sign-up and sign-out. An
//! [`AuthConnector`] hands out clients, restoring a persisted session when
//! given the previously signed-in user id.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AuthErrorCode, Codename, Credentials, User, UserId};

use super::{Subscription, define_port_error};

define_port_error! {
    /// Errors raised by auth provider adapters.
    pub enum AuthProviderError {
        /// The provider rejected the request with a stable code such as
        /// `auth/wrong-password`.
        Rejected { code: String } => "auth provider rejected the request: {code}",
        /// The provider could not be reached.
        Unavailable { message: String } => "auth provider unavailable: {message}",
        /// The operation needs a signed-in user.
        SignedOut => "no user is signed in",
    }
}

impl AuthProviderError {
    /// Provider code, when the provider supplied one.
    #[must_use]
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::Rejected { code } => Some(AuthErrorCode::parse(code)),
            _ => None,
        }
    }

    /// Rejection carrying a known code.
    #[must_use]
    pub fn rejected_with(code: &AuthErrorCode) -> Self {
        Self::rejected(code.as_str())
    }
}

/// One client session against the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Subscribe to sign-in state.
    ///
    /// The current state is delivered first, followed by every change.
    fn subscribe(&self) -> Subscription<Option<User>>;

    /// Sign in with existing credentials.
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthProviderError>;

    /// Create an account and sign it in.
    async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthProviderError>;

    /// Set the signed-in user's display name.
    async fn set_display_name(&self, name: &Codename) -> Result<(), AuthProviderError>;

    /// Sign the current user out.
    async fn sign_out(&self) -> Result<(), AuthProviderError>;
}

/// Factory for [`AuthProvider`] clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthConnector: Send + Sync {
    /// Open a client, restoring the session of `persisted` when it still
    /// refers to a known account.
    async fn connect(
        &self,
        persisted: Option<UserId>,
    ) -> Result<Arc<dyn AuthProvider>, AuthProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AuthProviderError::rejected("auth/weak-password"), Some(AuthErrorCode::WeakPassword))]
    #[case(AuthProviderError::unavailable("offline"), None)]
    #[case(AuthProviderError::signed_out(), None)]
    fn code_is_parsed_from_rejections(
        #[case] error: AuthProviderError,
        #[case] expected: Option<AuthErrorCode>,
    ) {
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    fn rejected_with_uses_wire_code() {
        let error = AuthProviderError::rejected_with(&AuthErrorCode::TooManyRequests);
        assert_eq!(
            error.to_string(),
            "auth provider rejected the request: auth/too-many-requests"
        );
    }
}
