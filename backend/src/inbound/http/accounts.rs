//! Landing, sign-in, sign-up and sign-out handlers.
//!
//! ```text
//! GET  /          landing page (visitors only)
//! GET  /login     sign-in page
//! POST /login     {"email":"ada@example.com","password":"hunter22"}
//! GET  /signup    sign-up page
//! POST /signup    {"email":"ada@example.com","password":"hunter22"}
//! POST /logout
//! ```
//!
//! Successful form posts answer `303 See Other` towards `/heists`, mirroring
//! the navigation the form requested.

use std::sync::Arc;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::guard::{CurrentAuth, Guarded, follow, see_other};
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::RecordingNavigator;
use crate::domain::views::NavbarView;
use crate::domain::{ApiResult, Error, LoginForm, Route, SignupForm};

/// Sign-in or sign-up request body.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    /// Account email address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Plain-text password; zeroised once submitted.
    #[schema(example = "hunter22")]
    pub password: String,
}

impl CredentialsRequest {
    fn into_parts(self) -> (String, Zeroizing<String>) {
        (self.email, Zeroizing::new(self.password))
    }
}

/// Link to the other auth page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlternateLink {
    /// Lead-in text such as "Don't have an account?".
    pub prompt: &'static str,
    /// Link text.
    pub label: &'static str,
    /// Target path.
    pub href: String,
}

/// One selling point on the landing page.
#[derive(Debug, Serialize, ToSchema)]
pub struct Feature {
    /// Feature heading.
    pub title: &'static str,
    /// One-sentence blurb.
    pub description: &'static str,
}

/// Landing page for visitors.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    /// Navigation bar for a visitor.
    pub navbar: NavbarView,
    /// Hero copy.
    pub pitch: &'static str,
    /// Link to the sign-up page.
    pub call_to_action: AlternateLink,
    /// Selling points in display order.
    pub features: Vec<Feature>,
}

const PITCH: &str = "Transform your workplace into an adventure zone. Create covert missions, \
assign harmless pranks to your teammates, and track completed heists.";

const FEATURES: [(&str, &str); 3] = [
    (
        "Quick Missions",
        "Create playful tasks in seconds. From sticky note mysteries to coffee run challenges.",
    ),
    (
        "Team Adventures",
        "Assign heists to teammates and build office camaraderie through harmless mischief.",
    ),
    (
        "Track Progress",
        "Monitor active missions, celebrate completed pranks, and relive the best moments.",
    ),
];

/// Sign-in or sign-up page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthPage {
    /// Navigation bar for a visitor.
    pub navbar: NavbarView,
    /// Form heading.
    pub title: &'static str,
    /// Link to the other form.
    pub alternate: AlternateLink,
}

/// Landing page.
#[utoipa::path(
    get,
    path = "/",
    tags = ["accounts"],
    security([]),
    responses(
        (status = 200, description = "Landing page", body = LandingPage),
        (status = 303, description = "Members are sent to /heists")
    )
)]
#[get("/", wrap = "Guarded::public()")]
pub async fn home(auth: CurrentAuth) -> web::Json<LandingPage> {
    web::Json(LandingPage {
        navbar: NavbarView::new(auth.user()),
        pitch: PITCH,
        call_to_action: AlternateLink {
            prompt: "Tiny missions. Big office mischief.",
            label: "Start Your First Heist",
            href: Route::Signup.path(),
        },
        features: FEATURES
            .into_iter()
            .map(|(title, description)| Feature { title, description })
            .collect(),
    })
}

/// Sign-in page.
#[utoipa::path(
    get,
    path = "/login",
    tags = ["accounts"],
    security([]),
    responses(
        (status = 200, description = "Sign-in page", body = AuthPage),
        (status = 303, description = "Members are sent to /heists")
    )
)]
#[get("/login", wrap = "Guarded::public()")]
pub async fn login_page(auth: CurrentAuth) -> web::Json<AuthPage> {
    web::Json(AuthPage {
        navbar: NavbarView::new(auth.user()),
        title: "Log in to Your Account",
        alternate: AlternateLink {
            prompt: "Don't have an account?",
            label: "Sign up",
            href: Route::Signup.path(),
        },
    })
}

/// Sign in and start a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    tags = ["accounts"],
    security([]),
    responses(
        (status = 303, description = "Signed in", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid input", body = Error),
        (status = 401, description = "Invalid email or password", body = Error),
        (status = 503, description = "Too many attempts or auth unavailable", body = Error)
    )
)]
#[post("/login", wrap = "Guarded::public()")]
pub async fn login(
    auth: CurrentAuth,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let (email, password) = payload.into_inner().into_parts();
    let navigator = Arc::new(RecordingNavigator::new());
    let mut form = LoginForm::new(auth.provider(), navigator.clone());
    let user = form.submit(&email, &password).await?;
    session.persist_user(&user.id)?;
    Ok(follow(&navigator).unwrap_or_else(|| see_other(&Route::Heists)))
}

/// Sign-up page.
#[utoipa::path(
    get,
    path = "/signup",
    tags = ["accounts"],
    security([]),
    responses(
        (status = 200, description = "Sign-up page", body = AuthPage),
        (status = 303, description = "Members are sent to /heists")
    )
)]
#[get("/signup", wrap = "Guarded::public()")]
pub async fn signup_page(auth: CurrentAuth) -> web::Json<AuthPage> {
    web::Json(AuthPage {
        navbar: NavbarView::new(auth.user()),
        title: "Signup for an Account",
        alternate: AlternateLink {
            prompt: "Already have an account?",
            label: "Log in",
            href: Route::Login.path(),
        },
    })
}

/// Create an account with a generated codename and start a session.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = CredentialsRequest,
    tags = ["accounts"],
    security([]),
    responses(
        (status = 303, description = "Account created", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid input or rejected by the provider", body = Error)
    )
)]
#[post("/signup", wrap = "Guarded::public()")]
pub async fn signup(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let (email, password) = payload.into_inner().into_parts();
    let navigator = Arc::new(RecordingNavigator::new());
    let mut form = SignupForm::new(auth.provider(), state.documents.clone(), navigator.clone());
    let user = form.submit(&email, &password).await?;
    session.persist_user(&user.id)?;
    Ok(follow(&navigator).unwrap_or_else(|| see_other(&Route::Heists)))
}

/// Sign out and drop the session cookie.
#[utoipa::path(
    post,
    path = "/logout",
    tags = ["accounts"],
    responses(
        (status = 303, description = "Signed out; sent to /login")
    )
)]
#[post("/logout", wrap = "Guarded::dashboard()")]
pub async fn logout(auth: CurrentAuth, session: SessionContext) -> HttpResponse {
    if let Err(err) = auth.provider().sign_out().await {
        warn!(error = %err, "auth client refused sign-out; dropping the session anyway");
    }
    session.clear();
    see_other(&Route::Login)
}
