//! Avatar badge.

use serde::Serialize;
use utoipa::ToSchema;

/// Avatar for a codename.
///
/// An image source takes precedence over initials when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    /// Name the avatar represents.
    pub name: String,
    /// Image URL, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Initials shown when there is no image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
}

impl Avatar {
    /// Initials-only avatar for `name`.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        Self::with_image(name, None)
    }

    /// Avatar for `name`, preferring `image` when given.
    #[must_use]
    pub fn with_image(name: &str, image: Option<String>) -> Self {
        let initials = image.is_none().then(|| initials(name));
        Self {
            name: name.to_owned(),
            image,
            initials,
        }
    }
}

/// Initials for `name`.
///
/// Uses the first two ASCII uppercase letters when the name has at least
/// two, otherwise the first character uppercased.
///
/// # Examples
/// ```
/// use pocket_heist::domain::views::initials;
///
/// assert_eq!(initials("JohnSmith"), "JS");
/// assert_eq!(initials("alice"), "A");
/// ```
#[must_use]
pub fn initials(name: &str) -> String {
    let capitals: Vec<char> = name.chars().filter(char::is_ascii_uppercase).take(2).collect();
    if capitals.len() == 2 {
        return capitals.into_iter().collect();
    }
    name.chars()
        .next()
        .map(|first| first.to_uppercase().collect())
        .unwrap_or_default()
}
