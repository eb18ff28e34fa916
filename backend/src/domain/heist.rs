//! Heist aggregate and its document encoding.
//!
//! A heist is a time-boxed task one member assigns to another. Creation
//! writes `createdAt` and `deadline` as server-time sentinels in a single
//! write so the store resolves both from one clock reading; `deadline` is
//! therefore exactly [`HEIST_DURATION`] after `createdAt` and is never
//! recomputed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::document::{Document, FieldValue, Fields, Predicate};
use super::{User, UserId};

/// Time a heist stays open after creation.
pub const HEIST_DURATION: Duration = Duration::hours(48);

/// Identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "9f0c2d")]
pub struct HeistId(String);

impl HeistId {
    /// Wrap a store-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for HeistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recorded outcome of a heist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    /// The heist succeeded.
    Success,
    /// The heist failed.
    Failure,
}

impl FinalStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

/// A heist as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Heist {
    /// Store-assigned identifier.
    pub id: HeistId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Creator.
    pub created_by: UserId,
    /// Creator codename at creation time.
    pub created_by_codename: String,
    /// Assignee.
    pub assigned_to: UserId,
    /// Assignee codename at creation time.
    pub assigned_to_codename: String,
    /// Server-assigned creation instant.
    pub created_at: DateTime<Utc>,
    /// Server-assigned deadline.
    pub deadline: DateTime<Utc>,
    /// Outcome, `None` while undecided.
    pub final_status: Option<FinalStatus>,
}

/// Errors raised while decoding a stored heist document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeistDecodeError {
    /// A required field is absent.
    #[error("heist {id} is missing field `{field}`")]
    MissingField {
        /// Document identifier.
        id: String,
        /// Field name.
        field: &'static str,
    },
    /// A field holds a value of the wrong kind.
    #[error("heist {id} has an invalid `{field}` field")]
    InvalidField {
        /// Document identifier.
        id: String,
        /// Field name.
        field: &'static str,
    },
}

struct FieldReader<'a> {
    id: &'a str,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    fn get(&self, field: &'static str) -> Result<&'a FieldValue, HeistDecodeError> {
        self.fields
            .get(field)
            .ok_or_else(|| HeistDecodeError::MissingField {
                id: self.id.to_owned(),
                field,
            })
    }

    fn invalid(&self, field: &'static str) -> HeistDecodeError {
        HeistDecodeError::InvalidField {
            id: self.id.to_owned(),
            field,
        }
    }

    fn string(&self, field: &'static str) -> Result<String, HeistDecodeError> {
        self.get(field)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.invalid(field))
    }

    fn user_id(&self, field: &'static str) -> Result<UserId, HeistDecodeError> {
        UserId::new(self.string(field)?).map_err(|_| self.invalid(field))
    }

    fn timestamp(&self, field: &'static str) -> Result<DateTime<Utc>, HeistDecodeError> {
        self.get(field)?
            .as_timestamp()
            .ok_or_else(|| self.invalid(field))
    }

    fn final_status(&self) -> Result<Option<FinalStatus>, HeistDecodeError> {
        const FIELD: &str = "finalStatus";
        match self.fields.get(FIELD) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::String(value)) => FinalStatus::parse(value)
                .map(Some)
                .ok_or_else(|| self.invalid(FIELD)),
            Some(_) => Err(self.invalid(FIELD)),
        }
    }
}

impl TryFrom<&Document> for Heist {
    type Error = HeistDecodeError;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let reader = FieldReader {
            id: document.id.as_str(),
            fields: &document.fields,
        };
        Ok(Self {
            id: HeistId::new(document.id.clone()),
            title: reader.string("title")?,
            description: reader.string("description")?,
            created_by: reader.user_id("createdBy")?,
            created_by_codename: reader.string("createdByCodename")?,
            assigned_to: reader.user_id("assignedTo")?,
            assigned_to_codename: reader.string("assignedToCodename")?,
            created_at: reader.timestamp("createdAt")?,
            deadline: reader.timestamp("deadline")?,
            final_status: reader.final_status()?,
        })
    }
}

/// Input for creating a heist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHeist {
    /// Title as entered.
    pub title: String,
    /// Description as entered.
    pub description: String,
    /// Creator.
    pub created_by: UserId,
    /// Creator codename, `"Unknown"` when the creator has none.
    pub created_by_codename: String,
    /// Assignee.
    pub assigned_to: UserId,
    /// Assignee codename.
    pub assigned_to_codename: String,
}

impl NewHeist {
    /// Build creation input on behalf of `creator`.
    #[must_use]
    pub fn by(
        creator: &User,
        title: impl Into<String>,
        description: impl Into<String>,
        assigned_to: UserId,
        assigned_to_codename: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            created_by: creator.id.clone(),
            created_by_codename: creator.codename_or_unknown(),
            assigned_to,
            assigned_to_codename: assigned_to_codename.into(),
        }
    }

    /// Encode as document fields with server-time sentinels for
    /// `createdAt` and `deadline` and a null `finalStatus`.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        Fields::from([
            ("title".to_owned(), FieldValue::from(self.title)),
            ("description".to_owned(), FieldValue::from(self.description)),
            ("createdBy".to_owned(), FieldValue::from(String::from(self.created_by))),
            (
                "createdByCodename".to_owned(),
                FieldValue::from(self.created_by_codename),
            ),
            ("assignedTo".to_owned(), FieldValue::from(String::from(self.assigned_to))),
            (
                "assignedToCodename".to_owned(),
                FieldValue::from(self.assigned_to_codename),
            ),
            ("createdAt".to_owned(), FieldValue::server_time()),
            (
                "deadline".to_owned(),
                FieldValue::server_time_plus(HEIST_DURATION),
            ),
            ("finalStatus".to_owned(), FieldValue::Null),
        ])
    }
}

/// Named heist query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HeistFilter {
    /// Open heists assigned to the user.
    Active,
    /// Open heists the user created.
    Assigned,
    /// Past-deadline heists of anyone with an outcome recorded.
    ///
    /// Expired heists without an outcome match no filter.
    Expired,
}

impl HeistFilter {
    /// Every filter, in dashboard order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Assigned, Self::Expired];

    /// Query predicates for `user` evaluated at `now`.
    #[must_use]
    pub fn predicates(self, user: &UserId, now: DateTime<Utc>) -> Vec<Predicate> {
        match self {
            Self::Active => vec![
                Predicate::eq("assignedTo", user.as_str()),
                Predicate::gt("deadline", now),
            ],
            Self::Assigned => vec![
                Predicate::eq("createdBy", user.as_str()),
                Predicate::gt("deadline", now),
            ],
            Self::Expired => vec![
                Predicate::le("deadline", now),
                Predicate::not_eq("finalStatus", FieldValue::Null),
            ],
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Assigned => "assigned",
            Self::Expired => "expired",
        }
    }
}

/// Error returned for an unknown filter name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown heist filter `{0}`")]
pub struct UnknownHeistFilter(pub String);

impl FromStr for HeistFilter {
    type Err = UnknownHeistFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "assigned" => Ok(Self::Assigned),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownHeistFilter(other.to_owned())),
        }
    }
}

impl fmt::Display for HeistFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
