//! Tests for the heist handlers.

use super::*;
use crate::domain::document::HEISTS_COLLECTION;
use crate::domain::ports::{DocumentStore, DraftStores};
use crate::domain::{DRAFT_KEY, NewHeist, User};
use crate::inbound::http::test_utils::{TestBackend, cookie_for, location, test_app};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

fn heist_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard)
        .service(create_page)
        .service(create_heist)
        .service(heist_detail);
}

struct Crew {
    backend: TestBackend,
    ada: User,
    bob: User,
}

async fn crew() -> Crew {
    let backend = TestBackend::new();
    let ada = backend.member("ada@example.com", "BoldOwlLeaps").await;
    let bob = backend.member("bob@example.com", "QuietFoxHides").await;
    Crew { backend, ada, bob }
}

fn stapler_for(bob: &User) -> CreateHeistRequest {
    CreateHeistRequest {
        title: "Stapler".to_owned(),
        description: "Liberate the red stapler".to_owned(),
        assigned_to: bob.id.to_string(),
    }
}

async fn plant_heist(backend: &TestBackend, creator: &User, assignee: &User) -> String {
    let codename = assignee.codename_or_unknown();
    backend
        .documents
        .add_document(
            HEISTS_COLLECTION,
            NewHeist::by(
                creator,
                "Coffee run",
                "Swap the decaf for the good stuff",
                assignee.id.clone(),
                codename,
            )
            .into_fields(),
        )
        .await
        .expect("heist written")
}

fn section<'a>(body: &'a Value, filter: &str) -> &'a Value {
    body["dashboard"]["sections"]
        .as_array()
        .and_then(|sections| sections.iter().find(|s| s["filter"] == filter))
        .expect("section present")
}

#[rstest]
#[actix_web::test]
async fn created_heists_reach_both_dashboards() {
    let Crew { backend, ada, bob } = crew().await;
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let ada_cookie = cookie_for(&app, &ada.id).await;
    let bob_cookie = cookie_for(&app, &bob.id).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/heists")
            .cookie(ada_cookie.clone())
            .set_json(stapler_for(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/heists"));
    let created: CreatedHeist = test::read_body_json(res).await;
    assert_eq!(created.href, format!("/heists/{}", created.id));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/heists").cookie(bob_cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let active = section(&body, "active");
    assert_eq!(active["title"], "Your Active Heists");
    assert_eq!(active["body"]["kind"], "cards");
    let card = &active["body"]["cards"][0];
    assert_eq!(card["title"], "Stapler");
    assert_eq!(card["createdBy"], "BoldOwlLeaps");
    assert_eq!(card["assignedTo"], "QuietFoxHides");
    assert_eq!(card["hoursLeft"], "48h left");
    assert_eq!(section(&body, "assigned")["body"]["kind"], "empty");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/heists").cookie(ada_cookie).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(section(&body, "assigned")["body"]["kind"], "cards");
    assert_eq!(
        section(&body, "active")["body"],
        json!({"kind": "empty", "message": "No available heists."})
    );
    assert_eq!(body["navbar"]["canLogOut"], true);
}

#[rstest]
#[actix_web::test]
async fn assignees_outside_the_member_list_are_rejected() {
    let Crew { backend, ada, .. } = crew().await;
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let cookie = cookie_for(&app, &ada.id).await;
    let mut request = stapler_for(&ada);
    request.title = "Hi".to_owned();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/heists")
            .cookie(cookie)
            .set_json(request)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["details"]["fieldErrors"],
        json!({
            "title": "Title must be at least 3 characters",
            "assignedTo": "Please select a user to assign this heist to"
        })
    );
    let heists = backend
        .documents
        .list_documents(HEISTS_COLLECTION)
        .await
        .expect("listed");
    assert!(heists.is_empty());
}

#[rstest]
#[actix_web::test]
async fn creating_a_heist_discards_the_draft() {
    let Crew { backend, ada, bob } = crew().await;
    let drafts = backend.drafts.open(&ada.id).expect("store");
    drafts
        .set(DRAFT_KEY, r#"{"title":"Stap"}"#)
        .expect("draft saved");
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let cookie = cookie_for(&app, &ada.id).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/heists/create")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let page: Value = test::read_body_json(res).await;
    assert_eq!(page["title"], "Create a New Heist");
    assert_eq!(page["draft"]["title"], "Stap");
    assert_eq!(page["assignees"]["profiles"][0]["codename"], "QuietFoxHides");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/heists")
            .cookie(cookie)
            .set_json(stapler_for(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(drafts.get(DRAFT_KEY).expect("read"), None);
}

#[rstest]
#[actix_web::test]
async fn detail_page_shows_the_countdown() {
    let Crew { backend, ada, bob } = crew().await;
    let id = plant_heist(&backend, &ada, &bob).await;
    backend.clock.advance(std::time::Duration::from_secs(3_600));
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let cookie = cookie_for(&app, &bob.id).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/heists/{id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["page"]["state"], "found");
    assert_eq!(body["page"]["title"], "Coffee run");
    assert_eq!(body["page"]["timeRemaining"], "1d 23h");
    assert_eq!(body["page"]["createdBy"]["initials"], "BO");
}

#[rstest]
#[case(false, "notFound", "The heist you're looking for doesn't exist.")]
#[case(
    true,
    "error",
    "There was an error loading the heist details. Please try again."
)]
#[actix_web::test]
async fn detail_page_reports_missing_heists(
    #[case] offline: bool,
    #[case] state: &str,
    #[case] message: &str,
) {
    let Crew { backend, ada, .. } = crew().await;
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let cookie = cookie_for(&app, &ada.id).await;
    backend.documents.set_offline(offline);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/heists/nope")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["page"]["state"], state);
    assert_eq!(body["page"]["message"], message);
}

#[rstest]
#[actix_web::test]
async fn the_create_route_is_not_a_heist_id() {
    let Crew { backend, ada, .. } = crew().await;
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let cookie = cookie_for(&app, &ada.id).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/heists/create")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert!(body.get("page").is_none());
    assert_eq!(body["assignees"]["profiles"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn visitors_are_sent_to_login() {
    let backend = TestBackend::new();
    let app = test::init_service(test_app(backend.state(), heist_routes)).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/heists").to_request()).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}
