//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{App, HttpResponse, test, web};

use super::session::SessionContext;
use super::state::{HttpState, HttpStatePorts};
use crate::domain::document::USERS_COLLECTION;
use crate::domain::ports::{AuthProvider, DocumentStore};
use crate::domain::{Codename, Credentials, Error, User, UserId, UserProfile};
use crate::outbound::{MemoryAuthDirectory, MemoryDocumentStore, MemoryDraftStores};
use crate::test_support::{MutableClock, fixed_now};

/// Session middleware with a fresh key and a non-secure `session` cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// `Location` header of a response.
pub fn location<B>(res: &ServiceResponse<B>) -> Option<&str> {
    res.headers().get(LOCATION).and_then(|value| value.to_str().ok())
}

async fn adopt(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let id = UserId::new(id.into_inner()).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// App over `state` with session cookies, the routes added by `routes` and
/// a `/test/adopt/{id}` back door that signs the caller in as `id`.
pub fn test_app(
    state: HttpState,
    routes: impl FnOnce(&mut web::ServiceConfig),
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route("/test/adopt/{id}", web::post().to(adopt))
        .configure(routes)
}

/// Session cookie for `id`, obtained through the adopt back door.
pub async fn cookie_for<S, B>(app: &S, id: &UserId) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/test/adopt/{id}"))
            .to_request(),
    )
    .await;
    session_cookie(&res).expect("adopt sets a session cookie")
}

/// In-memory adapters behind an [`HttpState`], with handles for setup.
pub struct TestBackend {
    /// In-memory auth directory.
    pub directory: MemoryAuthDirectory,
    /// In-memory document store.
    pub documents: MemoryDocumentStore,
    /// In-memory draft stores.
    pub drafts: Arc<MemoryDraftStores>,
    /// Adjustable test clock.
    pub clock: Arc<MutableClock>,
}

impl TestBackend {
    /// Empty backend frozen at [`fixed_now`].
    pub fn new() -> Self {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        Self {
            directory: MemoryAuthDirectory::new(),
            documents: MemoryDocumentStore::new(clock.clone()),
            drafts: Arc::new(MemoryDraftStores::new()),
            clock,
        }
    }

    /// Handler state over these adapters.
    pub fn state(&self) -> HttpState {
        HttpState::new(HttpStatePorts {
            auth: Arc::new(self.directory.clone()),
            documents: Arc::new(self.documents.clone()),
            drafts: self.drafts.clone(),
            clock: self.clock.clone(),
        })
    }

    /// Register a member with `codename` and publish their profile.
    pub async fn member(&self, email: &str, codename: &str) -> User {
        let client = self.directory.client();
        let mut user = client
            .sign_up(&Credentials::from_parts(email, "hunter22"))
            .await
            .expect("account created");
        let codename = Codename::new(codename).expect("valid codename");
        client
            .set_display_name(&codename)
            .await
            .expect("display name set");
        let profile = UserProfile {
            id: user.id.clone(),
            codename: codename.clone(),
        };
        self.documents
            .set_document(USERS_COLLECTION, user.id.as_str(), profile.to_fields())
            .await
            .expect("profile written");
        user.display_name = Some(codename);
        user
    }
}
