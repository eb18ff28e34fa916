//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppSettings, ServerConfig};
pub use state_builders::{build_draft_stores, build_ports};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::accounts::{home, login, login_page, logout, signup, signup_page};
use crate::inbound::http::drafts::{delete_draft, get_draft, put_draft};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::heists::{create_heist, create_page, dashboard, heist_detail};
use crate::inbound::http::profiles::list_profiles;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::ws;

/// Per-worker inputs to [`build_app`].
#[derive(Clone)]
pub struct AppDependencies {
    /// Probe state shared across workers.
    pub health_state: web::Data<HealthState>,
    /// Ports shared across workers.
    pub http_state: web::Data<HttpState>,
    /// Session cookie encryption key.
    pub key: Key,
    /// Whether the session cookie carries `Secure`.
    pub cookie_secure: bool,
    /// Session cookie `SameSite` policy.
    pub same_site: SameSite,
    /// Session cookie lifetime.
    pub session_ttl: Duration,
}

/// Assemble the application: session cookies, tracing, every route and, in
/// debug builds, Swagger UI at `/docs`.
#[must_use]
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
        session_ttl,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
        .build();

    // `/heists/create` must be registered ahead of `/heists/{id}`.
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .service(home)
        .service(login_page)
        .service(login)
        .service(signup_page)
        .service(signup)
        .service(logout)
        .service(dashboard)
        .service(create_page)
        .service(create_heist)
        .service(heist_detail)
        .service(get_draft)
        .service(put_draft)
        .service(delete_draft)
        .service(list_profiles)
        .service(ws::heist_feed)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over `ports`.
///
/// The readiness probe flips to ready once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    ports: HttpStatePorts,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(HttpState::new(ports));
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        session_ttl,
        bind_addr,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
            session_ttl,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
