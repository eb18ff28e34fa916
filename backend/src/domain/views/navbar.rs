//! Site navigation bar.

use serde::Serialize;
use utoipa::ToSchema;

use super::Avatar;
use crate::domain::{Route, User};

/// Navigation bar contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavbarView {
    /// Brand name linking to the dashboard.
    pub brand: &'static str,
    /// Brand link target.
    pub brand_href: String,
    /// Tagline under the brand.
    pub tagline: &'static str,
    /// Create-heist link target.
    pub create_href: String,
    /// Whether the logout action is offered.
    pub can_log_out: bool,
    /// Signed-in member, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Avatar>,
}

impl NavbarView {
    /// Navbar for the given signed-in user.
    #[must_use]
    pub fn new(user: Option<&User>) -> Self {
        Self {
            brand: "Pocket Heist",
            brand_href: Route::Heists.path(),
            tagline: "Tiny missions. Big office mischief.",
            create_href: Route::CreateHeist.path(),
            can_log_out: user.is_some(),
            member: user.map(|user| Avatar::for_name(&user.codename_or_unknown())),
        }
    }
}
