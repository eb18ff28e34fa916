//! Heist feed tests: origin checks and a live socket round trip.

use super::*;
use crate::domain::document::HEISTS_COLLECTION;
use crate::domain::ports::DocumentStore;
use crate::domain::{NewHeist, User};
use crate::inbound::http::test_utils::{TestBackend, test_app};
use actix_web::cookie::Cookie;
use actix_web::dev::ServerHandle;
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::HttpServer;
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use futures_util::{SinkExt, StreamExt};
use rstest::rstest;
use serde_json::Value;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).expect("valid header value")
}

#[rstest]
#[case("http://127.0.0.1:8080", "127.0.0.1:8080", true)]
#[case("https://heists.example", "heists.example", true)]
#[case("http://localhost:3000", "127.0.0.1:8080", true)]
#[case("http://localhost:0", "127.0.0.1:8080", false)]
#[case("http://localhost", "127.0.0.1:8080", false)]
#[case("https://evil.example", "heists.example", false)]
#[case("https://heists.example.evil.com", "heists.example", false)]
#[case("wss://heists.example", "heists.example", false)]
fn evaluates_origins(#[case] origin: &str, #[case] host: &str, #[case] expected: bool) {
    let parsed = Url::parse(origin).expect("url should parse");
    assert_eq!(is_allowed_origin(&parsed, host), expected);
}

#[rstest]
#[case(header_value("not a url"), StatusCode::BAD_REQUEST)]
#[case(HeaderValue::from_bytes(&[0x80]).expect("opaque header value"), StatusCode::BAD_REQUEST)]
#[case(header_value("https://evil.example"), StatusCode::FORBIDDEN)]
fn rejects_bad_origin_headers(#[case] origin: HeaderValue, #[case] status: StatusCode) {
    let error = validate_origin(&origin, "heists.example").expect_err("origin rejected");
    assert_eq!(actix_web::ResponseError::status_code(&error), status);
}

struct FeedServer {
    url: String,
    handle: ServerHandle,
}

impl FeedServer {
    fn start(backend: &TestBackend) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let state = backend.state();
        let server = HttpServer::new(move || {
            test_app(state.clone(), |cfg| {
                cfg.service(heist_feed);
            })
        })
        .workers(1)
        .listen(listener)
        .expect("bind test server")
        .disable_signals()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            url: format!("http://{addr}"),
            handle,
        }
    }

    async fn cookie_for(&self, user: &User) -> Cookie<'static> {
        let response = awc::Client::default()
            .post(format!("{}/test/adopt/{}", self.url, user.id))
            .send()
            .await
            .expect("adopt request");
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("session cookie");
        Cookie::parse(raw.to_owned()).expect("cookie parses")
    }

    async fn connect(
        &self,
        path: &str,
        origin: &str,
        cookie: Option<&Cookie<'static>>,
    ) -> Result<Socket, awc::error::WsClientError> {
        let mut request = awc::Client::default()
            .ws(format!("{}{path}", self.url))
            .set_header(header::ORIGIN, origin.to_owned());
        if let Some(cookie) = cookie {
            request = request.set_header(
                header::COOKIE,
                format!("{}={}", cookie.name(), cookie.value()),
            );
        }
        request.connect().await.map(|(_, socket)| socket)
    }
}

async fn next_text(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Next section for `filter` that has finished loading.
async fn next_settled(socket: &mut Socket, filter: &str) -> Value {
    loop {
        let section = next_text(socket).await;
        if section["filter"] == filter && section["body"]["kind"] != "loading" {
            return section;
        }
    }
}

async fn plant_heist(backend: &TestBackend, creator: &User, assignee: &User, title: &str) {
    backend
        .documents
        .add_document(
            HEISTS_COLLECTION,
            NewHeist::by(
                creator,
                title,
                "Swap the decaf for the good stuff",
                assignee.id.clone(),
                assignee.codename_or_unknown(),
            )
            .into_fields(),
        )
        .await
        .expect("heist written");
}

#[rstest]
#[actix_rt::test]
async fn feed_follows_writes_and_filter_switches() {
    let backend = TestBackend::new();
    let ada = backend.member("ada@example.com", "BoldOwlLeaps").await;
    let bob = backend.member("bob@example.com", "QuietFoxHides").await;
    plant_heist(&backend, &ada, &bob, "Coffee run").await;
    let server = FeedServer::start(&backend);
    let cookie = server.cookie_for(&bob).await;
    let mut socket = server
        .connect("/ws/heists", &server.url, Some(&cookie))
        .await
        .expect("feed connects");

    let section = next_settled(&mut socket, "active").await;
    assert_eq!(section["title"], "Your Active Heists");
    assert_eq!(section["body"]["cards"].as_array().map(Vec::len), Some(1));

    plant_heist(&backend, &ada, &bob, "Stapler").await;
    let section = next_settled(&mut socket, "active").await;
    assert_eq!(section["body"]["cards"].as_array().map(Vec::len), Some(2));

    socket
        .send(Message::Text(r#"{"filter":"assigned"}"#.into()))
        .await
        .expect("send filter");
    let section = next_settled(&mut socket, "assigned").await;
    assert_eq!(section["body"]["kind"], "empty");

    server.handle.stop(false).await;
}

#[rstest]
#[actix_rt::test]
async fn malformed_requests_close_the_feed() {
    let backend = TestBackend::new();
    let ada = backend.member("ada@example.com", "BoldOwlLeaps").await;
    let server = FeedServer::start(&backend);
    let cookie = server.cookie_for(&ada).await;
    let mut socket = server
        .connect("/ws/heists?filter=expired", &server.url, Some(&cookie))
        .await
        .expect("feed connects");
    next_settled(&mut socket, "expired").await;

    socket
        .send(Message::Text("not-json".into()))
        .await
        .expect("send text");
    loop {
        match socket.next().await.expect("response frame").expect("frame") {
            Frame::Close(reason) => {
                assert_eq!(reason.expect("reason").code, awc::ws::CloseCode::Policy);
                break;
            }
            Frame::Text(_) | Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    server.handle.stop(false).await;
}

#[rstest]
#[actix_rt::test]
async fn upgrades_are_refused_without_a_member_or_a_trusted_origin() {
    let backend = TestBackend::new();
    let ada = backend.member("ada@example.com", "BoldOwlLeaps").await;
    let server = FeedServer::start(&backend);
    let cookie = server.cookie_for(&ada).await;

    assert!(server.connect("/ws/heists", &server.url, None).await.is_err());
    assert!(
        server
            .connect("/ws/heists", "https://evil.example", Some(&cookie))
            .await
            .is_err()
    );
    assert!(
        server
            .connect("/ws/heists?filter=stale", &server.url, Some(&cookie))
            .await
            .is_err()
    );

    server.handle.stop(false).await;
}
