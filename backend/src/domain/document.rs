//! Schemaless document model shared by the document store port and the
//! codecs that translate documents into typed aggregates.
//!
//! Documents are flat maps of named [`FieldValue`]s. Query filters are
//! conjunctions of [`Predicate`]s evaluated field by field.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// Collection holding heist documents.
pub const HEISTS_COLLECTION: &str = "heists";
/// Collection holding public user profiles.
pub const USERS_COLLECTION: &str = "users";

/// Field map of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// Value stored under a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Resolved instant.
    Timestamp(DateTime<Utc>),
    /// Placeholder replaced by the store with its own clock reading plus
    /// `offset` when the write is applied.
    ///
    /// All sentinels in one write resolve against the same reading.
    ServerTime {
        /// Offset added to the store's clock reading.
        offset: Duration,
    },
}

impl FieldValue {
    /// Sentinel resolving to the store's clock reading.
    #[must_use]
    pub fn server_time() -> Self {
        Self::ServerTime {
            offset: Duration::zero(),
        }
    }

    /// Sentinel resolving to the store's clock reading plus `offset`.
    #[must_use]
    pub fn server_time_plus(offset: Duration) -> Self {
        Self::ServerTime { offset }
    }

    /// Borrow the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Return the instant, if this is a resolved timestamp.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether the value is an explicit null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Replace a server-time sentinel with a concrete timestamp.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::ServerTime { offset } => Self::Timestamp(now + offset),
            other => other,
        }
    }

    fn partial_cmp_same_kind(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(std::cmp::Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Resolve every server-time sentinel in `fields` against one reading.
#[must_use]
pub fn resolve_server_time(fields: Fields, now: DateTime<Utc>) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.resolve(now)))
        .collect()
}

/// Stored document with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier unique within the collection.
    pub id: String,
    /// Field values.
    pub fields: Fields,
}

/// Comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Field equals the value.
    Eq,
    /// Field exists and differs from the value.
    NotEq,
    /// Field is strictly greater than the value.
    Gt,
    /// Field is less than or equal to the value.
    Le,
}

/// Single field condition in a query filter.
///
/// A document lacking the field never matches, whatever the comparison.
/// Ordering comparisons between values of different kinds never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Field name.
    pub field: String,
    /// Comparison operator.
    pub op: Comparison,
    /// Operand.
    pub value: FieldValue,
}

impl Predicate {
    /// `field == value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Eq, value)
    }

    /// `field != value`, requiring the field to be present.
    #[must_use]
    pub fn not_eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::NotEq, value)
    }

    /// `field > value`.
    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Gt, value)
    }

    /// `field <= value`.
    #[must_use]
    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Le, value)
    }

    fn new(field: impl Into<String>, op: Comparison, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate the predicate against a document's fields.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        match self.op {
            Comparison::Eq => actual == &self.value,
            Comparison::NotEq => actual != &self.value,
            Comparison::Gt => actual
                .partial_cmp_same_kind(&self.value)
                .is_some_and(std::cmp::Ordering::is_gt),
            Comparison::Le => actual
                .partial_cmp_same_kind(&self.value)
                .is_some_and(std::cmp::Ordering::is_le),
        }
    }
}

/// Whether `fields` satisfies every predicate.
#[must_use]
pub fn matches_all(predicates: &[Predicate], fields: &Fields) -> bool {
    predicates.iter().all(|predicate| predicate.matches(fields))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for predicate evaluation.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0)
            .single()
            .expect("valid fixture time")
    }

    #[fixture]
    fn fields() -> Fields {
        Fields::from([
            ("assignedTo".to_owned(), FieldValue::from("u1")),
            ("deadline".to_owned(), FieldValue::from(at(12))),
            ("finalStatus".to_owned(), FieldValue::Null),
        ])
    }

    #[rstest]
    #[case(Predicate::eq("assignedTo", "u1"), true)]
    #[case(Predicate::eq("assignedTo", "u2"), false)]
    #[case(Predicate::gt("deadline", at(11)), true)]
    #[case(Predicate::gt("deadline", at(12)), false)]
    #[case(Predicate::le("deadline", at(12)), true)]
    #[case(Predicate::le("deadline", at(11)), false)]
    #[case(Predicate::not_eq("finalStatus", FieldValue::Null), false)]
    #[case(Predicate::eq("finalStatus", FieldValue::Null), true)]
    #[case(Predicate::not_eq("createdBy", "u1"), false)]
    #[case(Predicate::gt("assignedTo", at(1)), false)]
    fn predicate_evaluation(fields: Fields, #[case] predicate: Predicate, #[case] expected: bool) {
        assert_eq!(predicate.matches(&fields), expected);
    }

    #[rstest]
    fn sentinels_resolve_against_one_reading() {
        let now = at(8);
        let fields = Fields::from([
            ("createdAt".to_owned(), FieldValue::server_time()),
            (
                "deadline".to_owned(),
                FieldValue::server_time_plus(Duration::hours(48)),
            ),
            ("title".to_owned(), FieldValue::from("Vault")),
        ]);

        let resolved = resolve_server_time(fields, now);

        assert_eq!(resolved["createdAt"], FieldValue::Timestamp(now));
        assert_eq!(
            resolved["deadline"],
            FieldValue::Timestamp(now + Duration::hours(48))
        );
        assert_eq!(resolved["title"], FieldValue::from("Vault"));
    }

    #[rstest]
    fn empty_filter_matches_everything(fields: Fields) {
        assert!(matches_all(&[], &fields));
    }
}
