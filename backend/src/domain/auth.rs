//! Authentication primitives: credentials, auth provider error codes and the
//! user-facing messages the sign-in and sign-up flows show for them.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port.

use zeroize::Zeroizing;

use super::validation::{
    FieldErrors, validate_email, validate_new_password, validate_password,
};

/// Validated email/password pair.
///
/// ## Invariants
/// - `email` passed the email pattern check.
/// - `password` is non-empty; signup credentials are at least six
///   characters long. Whitespace is preserved.
///
/// # Examples
/// ```
/// use pocket_heist::domain::Credentials;
///
/// let creds = Credentials::for_sign_in("ada@example.com", "hunter2").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Validate sign-in input.
    pub fn for_sign_in(email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("email", validate_email(email));
        errors.check("password", validate_password(password));
        errors.into_result()?;
        Ok(Self::from_parts(email, password))
    }

    /// Validate sign-up input, which additionally enforces a minimum
    /// password length.
    pub fn for_sign_up(email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("email", validate_email(email));
        errors.check("password", validate_new_password(password));
        errors.into_result()?;
        Ok(Self::from_parts(email, password))
    }

    /// Build credentials without validation.
    ///
    /// Adapters use this to forward caller input verbatim so the provider
    /// can apply its own rules.
    #[must_use]
    pub fn from_parts(email: &str, password: &str) -> Self {
        Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        }
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Error codes reported by auth providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// Credentials did not match an account.
    InvalidCredential,
    /// No account exists for the email.
    UserNotFound,
    /// Password did not match.
    WrongPassword,
    /// The provider throttled the caller.
    TooManyRequests,
    /// Signup email already belongs to an account.
    EmailAlreadyInUse,
    /// Email address rejected by the provider.
    InvalidEmail,
    /// Password rejected as too weak.
    WeakPassword,
    /// Any other provider code.
    Other(String),
}

impl AuthErrorCode {
    /// Parse a provider code such as `auth/wrong-password`.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/invalid-credential" => Self::InvalidCredential,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/wrong-password" => Self::WrongPassword,
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/weak-password" => Self::WeakPassword,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Provider wire code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidCredential => "auth/invalid-credential",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WeakPassword => "auth/weak-password",
            Self::Other(code) => code.as_str(),
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message shown by the sign-in form for a provider code.
#[must_use]
pub fn sign_in_message(code: Option<&AuthErrorCode>) -> &'static str {
    match code {
        Some(
            AuthErrorCode::InvalidCredential
            | AuthErrorCode::UserNotFound
            | AuthErrorCode::WrongPassword,
        ) => "Invalid email or password",
        Some(AuthErrorCode::TooManyRequests) => "Too many attempts. Please try again later.",
        _ => "Failed to log in. Please try again.",
    }
}

/// Field and message shown by the sign-up form for a provider code.
#[must_use]
pub fn sign_up_message(code: Option<&AuthErrorCode>) -> (&'static str, &'static str) {
    match code {
        Some(AuthErrorCode::EmailAlreadyInUse) => {
            ("email", "An account with this email already exists")
        }
        Some(AuthErrorCode::InvalidEmail) => ("password", "Invalid email address"),
        Some(AuthErrorCode::WeakPassword) => (
            "password",
            "Password is too weak. Please use a stronger password.",
        ),
        _ => ("password", "Failed to create account. Please try again."),
    }
}
