//! Route guards as request middleware.
//!
//! [`Guarded`] resolves the visitor's auth state once per request. It opens
//! an auth client restoring the member id held in the session cookie, waits
//! for the client's first notification and evaluates a [`RouteGuard`].
//! Visitors who do not belong receive `303 See Other`; everyone else reaches
//! the handler with a [`CurrentAuth`] in the request extensions.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::LOCATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::{AuthProvider, Navigation, RecordingNavigator};
use crate::domain::{
    AuthSession, AuthState, Error, GuardKind, GuardView, Route, RouteGuard, User, UserId,
};

/// `303 See Other` pointing at `route`.
#[must_use]
pub fn see_other(route: &Route) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, route.path()))
        .finish()
}

/// Response for the last navigation `navigator` recorded, if any.
#[must_use]
pub fn follow(navigator: &RecordingNavigator) -> Option<HttpResponse> {
    navigator.last().as_ref().map(Navigation::route).map(see_other)
}

/// Auth state resolved for the current request.
#[derive(Clone)]
pub struct CurrentAuth {
    session: Arc<AuthSession>,
    state: AuthState,
}

impl CurrentAuth {
    /// Open a client restoring `persisted` and wait for its first report.
    ///
    /// After [`HttpState::settle_timeout`] the still-loading state is used.
    pub async fn resolve(
        state: &HttpState,
        persisted: Option<UserId>,
    ) -> Result<Self, Error> {
        let provider = state.auth.connect(persisted).await.map_err(|err| {
            error!(error = %err, "failed to open auth client");
            Error::service_unavailable("Authentication service unavailable")
        })?;
        let session = AuthSession::start(provider);
        let resolved = match timeout(state.settle_timeout, session.resolved()).await {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!("auth client did not report in time");
                session.state()
            }
        };
        Ok(Self {
            session: Arc::new(session),
            state: resolved,
        })
    }

    /// State the guard evaluated.
    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Signed-in member, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Signed-in member or `401 Unauthorized`.
    pub fn require_user(&self) -> Result<&User, Error> {
        self.user()
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Auth client for this request.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(self.session.provider())
    }

    /// Live auth state, for watches that outlive the guard check.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.session.watch()
    }
}

impl FromRequest for CurrentAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let auth = req.extensions().get::<Self>().cloned();
        ready(auth.ok_or_else(|| {
            error!(path = %req.path(), "auth state requested outside a guarded scope");
            Error::internal("auth state requested outside a guarded scope")
        }))
    }
}

/// Middleware applying a [`RouteGuard`] to a scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use pocket_heist::inbound::http::guard::Guarded;
///
/// let app = App::new().service(web::scope("/heists").wrap(Guarded::dashboard()));
/// ```
#[derive(Clone, Copy)]
pub struct Guarded {
    kind: GuardKind,
}

impl Guarded {
    /// Signed-in pages; visitors go to `/login`.
    #[must_use]
    pub fn dashboard() -> Self {
        Self {
            kind: GuardKind::Dashboard,
        }
    }

    /// Sign-in and sign-up pages; members go to `/heists`.
    #[must_use]
    pub fn public() -> Self {
        Self {
            kind: GuardKind::Public,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Guarded
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = GuardedMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GuardedMiddleware {
            service: Rc::new(service),
            kind: self.kind,
        }))
    }
}

/// Service wrapper produced by [`Guarded`].
pub struct GuardedMiddleware<S> {
    service: Rc<S>,
    kind: GuardKind,
}

impl<S, B> Service<ServiceRequest> for GuardedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let kind = self.kind;
        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<HttpState>>().cloned() else {
                error!(path = %req.path(), "guarded scope mounted without HTTP state");
                return Err(Error::internal("HTTP state missing").into());
            };
            let persisted = SessionContext::new(req.get_session())
                .user_id()
                .unwrap_or_else(|err| {
                    warn!(error = %err, "ignoring unreadable session");
                    None
                });
            let auth = CurrentAuth::resolve(&state, persisted).await?;

            let navigator = Arc::new(RecordingNavigator::new());
            let guard = RouteGuard::new(kind, navigator.clone());
            match guard.evaluate(auth.state()) {
                GuardView::Content => {
                    req.extensions_mut().insert(auth);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                GuardView::Loading => {
                    let Some(response) = follow(&navigator) else {
                        return Err(Error::service_unavailable("Authentication is still loading").into());
                    };
                    debug!(?kind, path = %req.path(), "guard redirected request");
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests;
