//! Field-scoped validation shared by the forms.
//!
//! Validators return the first failing message for a field. Length bounds
//! count Unicode scalar values; minimums are measured after trimming and
//! maximums on the raw input.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use super::Error;

/// Messages keyed by form field name.
///
/// Field names use the camelCase wire names (`title`, `assignedTo`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record `message` for `field`, keeping an earlier message if present.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Record the failing message from a validator result.
    pub fn check(&mut self, field: &'static str, result: Result<(), &'static str>) {
        if let Err(message) = result {
            self.insert(field, message);
        }
    }

    /// Message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when empty, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Structured details for an error payload.
    #[must_use]
    pub fn to_details(&self) -> Value {
        json!({ "fieldErrors": self })
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        let details = errors.to_details();
        Error::invalid_request("validation failed").with_details(details)
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| match Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$") {
        Ok(regex) => regex,
        Err(err) => panic!("email pattern must compile: {err}"),
    })
}

// Lengths below are UTF-16 code units, so an astral emoji counts twice.

/// Minimum title length after trimming.
pub const TITLE_MIN: usize = 3;
/// Maximum title length.
pub const TITLE_MAX: usize = 100;
/// Minimum description length after trimming.
pub const DESCRIPTION_MIN: usize = 10;
/// Maximum description length.
pub const DESCRIPTION_MAX: usize = 500;
/// Minimum password length at signup.
pub const PASSWORD_MIN: usize = 6;

/// Length as a browser form counts it, in UTF-16 code units.
fn form_length(value: &str) -> usize {
    value.encode_utf16().count()
}

fn bounded(
    value: &str,
    min: usize,
    max: usize,
    messages: [&'static str; 3],
) -> Result<(), &'static str> {
    let [required, too_short, too_long] = messages;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(required)
    } else if form_length(trimmed) < min {
        Err(too_short)
    } else if form_length(value) > max {
        Err(too_long)
    } else {
        Ok(())
    }
}

/// Validate a heist title.
pub fn validate_title(title: &str) -> Result<(), &'static str> {
    bounded(
        title,
        TITLE_MIN,
        TITLE_MAX,
        [
            "Title is required",
            "Title must be at least 3 characters",
            "Title must not exceed 100 characters",
        ],
    )
}

/// Validate a heist description.
pub fn validate_description(description: &str) -> Result<(), &'static str> {
    bounded(
        description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
        [
            "Description is required",
            "Description must be at least 10 characters",
            "Description must not exceed 500 characters",
        ],
    )
}

/// Validate the selected assignee.
pub fn validate_assignee(assigned_to: &str) -> Result<(), &'static str> {
    if assigned_to.is_empty() {
        Err("Please select a user to assign this heist to")
    } else {
        Ok(())
    }
}

/// Validate an email address.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        Err("Email is required")
    } else if !email_regex().is_match(email) {
        Err("Please enter a valid email address")
    } else {
        Ok(())
    }
}

/// Validate a sign-in password.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.is_empty() {
        Err("Password is required")
    } else {
        Ok(())
    }
}

/// Validate a new account password.
pub fn validate_new_password(password: &str) -> Result<(), &'static str> {
    validate_password(password)?;
    if form_length(password) < PASSWORD_MIN {
        Err("Password must be at least 6 characters")
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the field validators.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("", Err("Title is required"))]
    #[case("   ", Err("Title is required"))]
    #[case(" ab ", Err("Title must be at least 3 characters"))]
    #[case("abc", Ok(()))]
    #[case(&"x".repeat(100), Ok(()))]
    #[case(&"x".repeat(101), Err("Title must not exceed 100 characters"))]
    #[case("🦝🦝", Ok(()))]
    #[case("é", Err("Title must be at least 3 characters"))]
    #[case(&"🦝".repeat(50), Ok(()))]
    #[case(&"🦝".repeat(51), Err("Title must not exceed 100 characters"))]
    fn title_rules(#[case] title: &str, #[case] expected: Result<(), &'static str>) {
        assert_eq!(validate_title(title), expected);
    }

    #[rstest]
    #[case("", Err("Description is required"))]
    #[case("too short", Err("Description must be at least 10 characters"))]
    #[case("   padded    ", Err("Description must be at least 10 characters"))]
    #[case("long enough", Ok(()))]
    #[case(&"d".repeat(501), Err("Description must not exceed 500 characters"))]
    fn description_rules(#[case] description: &str, #[case] expected: Result<(), &'static str>) {
        assert_eq!(validate_description(description), expected);
    }

    #[rstest]
    #[case("", Err("Email is required"))]
    #[case("not-an-email", Err("Please enter a valid email address"))]
    #[case("a b@c.de", Err("Please enter a valid email address"))]
    #[case("a@b", Err("Please enter a valid email address"))]
    #[case("a@b.co", Ok(()))]
    fn email_rules(#[case] email: &str, #[case] expected: Result<(), &'static str>) {
        assert_eq!(validate_email(email), expected);
    }

    #[rstest]
    #[case("", Err("Password is required"))]
    #[case("12345", Err("Password must be at least 6 characters"))]
    #[case("123456", Ok(()))]
    #[case("🔑🔑🔑", Ok(()))]
    #[case("🔑🔑", Err("Password must be at least 6 characters"))]
    fn new_password_rules(#[case] password: &str, #[case] expected: Result<(), &'static str>) {
        assert_eq!(validate_new_password(password), expected);
    }

    #[rstest]
    fn sign_in_password_has_no_length_rule() {
        assert_eq!(validate_password("1"), Ok(()));
    }

    #[rstest]
    fn field_errors_keep_the_first_message() {
        let mut errors = FieldErrors::default();
        errors.insert("title", "first");
        errors.insert("title", "second");
        assert_eq!(errors.get("title"), Some("first"));
        assert_eq!(errors.len(), 1);
    }

    #[rstest]
    fn field_errors_convert_to_invalid_request() {
        let mut errors = FieldErrors::default();
        errors.check("assignedTo", validate_assignee(""));
        let error = Error::from(errors);
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details attached");
        assert_eq!(
            details["fieldErrors"]["assignedTo"],
            "Please select a user to assign this heist to"
        );
    }
}
