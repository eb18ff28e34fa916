//! User data model.
//!
//! A [`User`] is the identity reported by the auth port. A [`UserProfile`] is
//! the public record written to the `users` collection at signup so other
//! members can pick assignees.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::document::{FieldValue, Fields};

/// Validation errors returned by the user newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier carried surrounding whitespace.
    #[error("user id must not contain surrounding whitespace")]
    InvalidId,
    /// The codename was blank.
    #[error("codename must not be empty")]
    EmptyCodename,
}

/// Stable user identifier issued by the auth provider.
///
/// The value is opaque; only emptiness and surrounding whitespace are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "u_4c1f")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Display name assigned to a member, normally produced by the codename
/// generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "SneakyPandaSprints")]
pub struct Codename(String);

impl Codename {
    /// Validate and construct a [`Codename`].
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyCodename);
        }
        Ok(Self(name))
    }

    /// Wrap a name assembled from non-empty generator words.
    pub(crate) fn from_generated(name: String) -> Self {
        debug_assert!(!name.trim().is_empty());
        Self(name)
    }

    /// Borrow the codename as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Codename {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Codename {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Codename> for String {
    fn from(value: Codename) -> Self {
        value.0
    }
}

/// Authenticated identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Sign-in email address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Codename, absent until the signup flow assigns one.
    pub display_name: Option<Codename>,
}

impl User {
    /// Codename to record on documents created by this user.
    ///
    /// Falls back to `"Unknown"` when no display name has been assigned.
    #[must_use]
    pub fn codename_or_unknown(&self) -> String {
        self.display_name
            .as_ref()
            .map_or_else(|| UNKNOWN_CODENAME.to_owned(), |name| name.to_string())
    }
}

/// Codename recorded when the creator has no display name.
pub const UNKNOWN_CODENAME: &str = "Unknown";

/// Public profile stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Profile owner.
    pub id: UserId,
    /// Codename shown when picking assignees.
    pub codename: Codename,
}

impl UserProfile {
    /// Encode the profile as document fields.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        Fields::from([
            ("id".to_owned(), FieldValue::from(self.id.as_str())),
            ("codename".to_owned(), FieldValue::from(self.codename.as_str())),
        ])
    }

    /// Decode a profile from a stored document.
    ///
    /// Returns `None` when a field is missing or malformed.
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        let id = fields.get("id")?.as_str()?;
        let codename = fields.get("codename")?.as_str()?;
        Some(Self {
            id: UserId::new(id).ok()?,
            codename: Codename::new(codename).ok()?,
        })
    }
}
