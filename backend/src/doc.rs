//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer, the view
//! model schemas they return and the session cookie security scheme. Swagger
//! UI serves the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::forms::HeistDraft;
use crate::domain::views::{
    Avatar, DashboardView, HeistCard, HeistDetail, HeistSection, NavbarView, SectionBody,
};
use crate::domain::{Error, ErrorCode, FinalStatus, HeistFilter, HeistId, UserId, UserProfile};
use crate::inbound::http::accounts::{
    AlternateLink, AuthPage, CredentialsRequest, Feature, LandingPage,
};
use crate::inbound::http::health::ProbeStatus;
use crate::inbound::http::heists::{
    CreateHeistPage, CreateHeistRequest, CreatedHeist, DashboardPage, HeistDetailPage,
};
use crate::inbound::http::profiles::AssigneeOptions;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /login or POST /signup.",
            ))),
        );
    }
}

/// OpenAPI document for the Pocket Heist HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Pocket Heist API",
        description = "Session-authenticated heist planning: accounts, dashboards, heist creation and live feeds."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::home,
        crate::inbound::http::accounts::login_page,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::signup_page,
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::heists::dashboard,
        crate::inbound::http::heists::create_page,
        crate::inbound::http::heists::create_heist,
        crate::inbound::http::heists::heist_detail,
        crate::inbound::http::drafts::get_draft,
        crate::inbound::http::drafts::put_draft,
        crate::inbound::http::drafts::delete_draft,
        crate::inbound::http::profiles::list_profiles,
        crate::inbound::ws::heist_feed,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserId,
        UserProfile,
        HeistId,
        HeistFilter,
        FinalStatus,
        HeistDraft,
        NavbarView,
        Avatar,
        HeistCard,
        SectionBody,
        HeistSection,
        DashboardView,
        HeistDetail,
        CredentialsRequest,
        AlternateLink,
        Feature,
        LandingPage,
        AuthPage,
        DashboardPage,
        CreateHeistPage,
        CreateHeistRequest,
        CreatedHeist,
        HeistDetailPage,
        AssigneeOptions,
        ProbeStatus,
    )),
    tags(
        (name = "accounts", description = "Landing, sign-up, sign-in and sign-out"),
        (name = "heists", description = "Dashboards, heist creation, detail pages and the live feed"),
        (name = "drafts", description = "The create-heist autosave slot"),
        (name = "profiles", description = "Members available as assignees"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
