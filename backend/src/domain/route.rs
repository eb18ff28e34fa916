//! Application routes.

use std::fmt;

use serde::Serialize;
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::RefOr;
use utoipa::{PartialSchema, ToSchema};

use super::HeistId;

/// Page the client can be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Route {
    /// Landing page.
    Home,
    /// Sign-in page.
    Login,
    /// Account creation page.
    Signup,
    /// Dashboard.
    Heists,
    /// Create-heist form.
    CreateHeist,
    /// Detail page of one heist.
    Heist(HeistId),
}

impl Route {
    /// URL path of the route.
    ///
    /// # Examples
    /// ```
    /// use pocket_heist::domain::{HeistId, Route};
    ///
    /// assert_eq!(Route::Heist(HeistId::new("h1")).path(), "/heists/h1");
    /// ```
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Signup => "/signup".to_owned(),
            Self::Heists => "/heists".to_owned(),
            Self::CreateHeist => "/heists/create".to_owned(),
            Self::Heist(id) => format!("/heists/{id}"),
        }
    }
}

// Documented as its string path; utoipa 5 does not accept `value_type` on enums.
impl PartialSchema for Route {
    fn schema() -> RefOr<Schema> {
        ObjectBuilder::new()
            .schema_type(Type::String)
            .examples(["/heists"])
            .into()
    }
}

impl ToSchema for Route {}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl From<Route> for String {
    fn from(value: Route) -> Self {
        value.path()
    }
}
