//! Behavioural coverage for the guard middleware.

use super::*;
use crate::domain::Credentials;
use crate::domain::ports::{
    AuthProviderError, MockAuthConnector, MockAuthProvider, Subscription, Unsubscribe,
};
use crate::inbound::http::test_utils::{TestBackend, session_cookie, test_session_middleware};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{App, test};
use rstest::rstest;
use std::time::Duration;

async fn whoami(auth: CurrentAuth) -> Result<HttpResponse, Error> {
    let user = auth.require_user()?;
    Ok(HttpResponse::Ok().body(user.id.to_string()))
}

async fn adopt(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let id = UserId::new(id.into_inner()).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&id)?;
    Ok(HttpResponse::Ok().finish())
}

fn guarded_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route("/adopt/{id}", web::get().to(adopt))
        .route("/unguarded", web::get().to(whoami))
        .service(
            web::scope("/members")
                .wrap(Guarded::dashboard())
                .route("", web::get().to(whoami)),
        )
        .service(
            web::scope("/visitors")
                .wrap(Guarded::public())
                .route("", web::get().to(|| async { HttpResponse::Ok().body("welcome") })),
        )
}

async fn a_registered_member(backend: &TestBackend) -> UserId {
    backend
        .directory
        .client()
        .sign_up(&Credentials::from_parts("ada@example.com", "hunter22"))
        .await
        .expect("account created")
        .id
}

fn location(res: &ServiceResponse<impl actix_web::body::MessageBody>) -> Option<&str> {
    res.headers().get(LOCATION).and_then(|value| value.to_str().ok())
}

#[rstest]
#[actix_web::test]
async fn visitors_are_sent_to_login() {
    let backend = TestBackend::new();
    let app = test::init_service(guarded_app(backend.state())).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/members").to_request()).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));

    let res = test::call_service(&app, test::TestRequest::get().uri("/visitors").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn members_reach_dashboard_pages_and_skip_public_ones() {
    let backend = TestBackend::new();
    let member = a_registered_member(&backend).await;
    let app = test::init_service(guarded_app(backend.state())).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/adopt/{member}"))
            .to_request(),
    )
    .await;
    let cookie: Cookie<'static> = session_cookie(&res).expect("session cookie");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/members").cookie(cookie.clone()).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, member.to_string());

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/visitors").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/heists"));
}

#[rstest]
#[actix_web::test]
async fn unknown_member_ids_are_signed_out() {
    let backend = TestBackend::new();
    let app = test::init_service(guarded_app(backend.state())).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/adopt/ghost").to_request()).await;
    let cookie = session_cookie(&res).expect("session cookie");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/members").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(location(&res), Some("/login"));
}

#[rstest]
#[actix_web::test]
async fn asking_for_auth_outside_a_guard_is_an_internal_error() {
    let backend = TestBackend::new();
    let app = test::init_service(guarded_app(backend.state())).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/unguarded").to_request()).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[rstest]
#[actix_web::test]
async fn unreachable_auth_service_is_unavailable() {
    let backend = TestBackend::new();
    let mut connector = MockAuthConnector::new();
    connector
        .expect_connect()
        .times(1)
        .returning(|_| Err(AuthProviderError::unavailable("offline")));
    let mut state = backend.state();
    state.auth = Arc::new(connector);
    let app = test::init_service(guarded_app(state)).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/members").to_request()).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn silent_auth_client_renders_nothing() {
    let backend = TestBackend::new();
    let (feed, subscription) = Subscription::channel(Unsubscribe::noop());
    let mut provider = MockAuthProvider::new();
    provider
        .expect_subscribe()
        .times(1)
        .return_once(move || subscription);
    let provider: Arc<dyn AuthProvider> = Arc::new(provider);
    let mut connector = MockAuthConnector::new();
    connector
        .expect_connect()
        .times(1)
        .return_once(move |_| Ok(provider));
    let mut state = backend.state().with_settle_timeout(Duration::from_millis(20));
    state.auth = Arc::new(connector);
    let app = test::init_service(guarded_app(state)).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/members").to_request()).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    drop(feed);
}
