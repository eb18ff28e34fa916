//! Dashboard, create-heist and heist detail handlers.
//!
//! Pages are served as JSON view models. Live data is read by opening the
//! same watches a long-lived client would use and waiting for their first
//! settled state; a watch that stays silent past the settle timeout is
//! reported as still loading.

use std::future::Future;
use std::sync::Arc;

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::drafts::open_drafts;
use super::guard::{CurrentAuth, Guarded};
use super::profiles::AssigneeOptions;
use super::state::HttpState;
use crate::domain::forms::load_assignees;
use crate::domain::ports::RecordingNavigator;
use crate::domain::views::{DashboardView, HeistPage, NavbarView};
use crate::domain::{
    ApiResult, CreateHeistForm, Error, HeistDraft, HeistFilter, HeistId, HeistList,
    HeistListWatch, HeistWatch, Route,
};

/// Signed-in dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    /// Navigation bar for the member.
    pub navbar: NavbarView,
    /// Active, assigned and expired sections.
    pub dashboard: DashboardView,
}

/// Create-heist form, restored from the member's draft.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHeistPage {
    /// Navigation bar for the member.
    pub navbar: NavbarView,
    /// Form heading.
    pub title: &'static str,
    /// Saved draft, or a blank one.
    pub draft: HeistDraft,
    /// Members the heist can go to.
    pub assignees: AssigneeOptions,
}

/// Heist detail page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeistDetailPage {
    /// Navigation bar for the member.
    pub navbar: NavbarView,
    /// `loading`, `error`, `notFound` or `found` with the heist.
    #[schema(value_type = Object)]
    pub page: HeistPage,
}

/// Create-heist submission.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHeistRequest {
    /// Heist title.
    #[schema(example = "Stapler")]
    pub title: String,
    /// Free-form briefing.
    #[serde(default)]
    pub description: String,
    /// Identifier of another member.
    #[serde(default)]
    pub assigned_to: String,
}

/// Identifier of a created heist.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedHeist {
    /// Store-assigned identifier.
    pub id: HeistId,
    /// Detail page path.
    pub href: String,
}

async fn settle<T>(
    state: &HttpState,
    settled: impl Future<Output = T>,
    current: impl FnOnce() -> T,
) -> T {
    match timeout(state.settle_timeout, settled).await {
        Ok(value) => value,
        Err(_) => {
            warn!("live query did not settle in time");
            current()
        }
    }
}

/// Active, assigned and expired heists of the signed-in member.
#[utoipa::path(
    get,
    path = "/heists",
    tags = ["heists"],
    responses(
        (status = 200, description = "Dashboard", body = DashboardPage),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[get("/heists", wrap = "Guarded::dashboard()")]
pub async fn dashboard(state: web::Data<HttpState>, auth: CurrentAuth) -> web::Json<DashboardPage> {
    let watches: Vec<HeistListWatch> = HeistFilter::ALL
        .into_iter()
        .map(|filter| {
            HeistListWatch::start(
                state.documents.clone(),
                state.clock.clone(),
                auth.watch(),
                filter,
            )
        })
        .collect();
    let mut lists: Vec<HeistList> = Vec::with_capacity(watches.len());
    for watch in &watches {
        lists.push(settle(&state, watch.settled(), || watch.state()).await);
    }
    let dashboard = DashboardView::new(&lists, state.clock.utc());
    web::Json(DashboardPage {
        navbar: NavbarView::new(auth.user()),
        dashboard,
    })
}

/// Create-heist form with the saved draft and assignable members.
#[utoipa::path(
    get,
    path = "/heists/create",
    tags = ["heists"],
    responses(
        (status = 200, description = "Create-heist form", body = CreateHeistPage),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[get("/heists/create", wrap = "Guarded::dashboard()")]
pub async fn create_page(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
) -> ApiResult<web::Json<CreateHeistPage>> {
    let user = auth.require_user()?;
    let drafts = open_drafts(&state, &user.id)?;
    let form = CreateHeistForm::mount(
        state.documents.clone(),
        drafts,
        Arc::new(RecordingNavigator::new()),
    );
    let assignees = load_assignees(state.documents.as_ref(), &user.id).await;
    Ok(web::Json(CreateHeistPage {
        navbar: NavbarView::new(Some(user)),
        title: "Create a New Heist",
        draft: form.draft().clone(),
        assignees: AssigneeOptions::from(&assignees),
    }))
}

/// Create a heist assigned to another member.
///
/// The saved draft is discarded on success.
#[utoipa::path(
    post,
    path = "/heists",
    request_body = CreateHeistRequest,
    tags = ["heists"],
    responses(
        (status = 303, description = "Heist created; sent to /heists", body = CreatedHeist),
        (status = 400, description = "Invalid input", body = Error),
        (status = 503, description = "The heist could not be written", body = Error)
    )
)]
#[post("/heists", wrap = "Guarded::dashboard()")]
pub async fn create_heist(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
    payload: web::Json<CreateHeistRequest>,
) -> ApiResult<HttpResponse> {
    let user = auth.require_user()?;
    let CreateHeistRequest {
        title,
        description,
        assigned_to,
    } = payload.into_inner();
    let assignees = load_assignees(state.documents.as_ref(), &user.id).await;
    // Only listed members can be picked; anyone else reads as no selection.
    let assigned_to = match assignees.find(&assigned_to) {
        Some(profile) => profile.id.to_string(),
        None => {
            if !assigned_to.is_empty() {
                debug!(assigned_to, "ignoring assignee outside the member list");
            }
            String::new()
        }
    };

    let navigator = Arc::new(RecordingNavigator::new());
    let drafts = open_drafts(&state, &user.id)?;
    let mut form = CreateHeistForm::mount(state.documents.clone(), drafts, navigator.clone());
    form.edit(|draft| {
        draft.title = title;
        draft.description = description;
    });
    form.select_assignee(&assigned_to, &assignees);
    let id = form.submit(Some(user)).await?;

    let target = navigator
        .last()
        .map_or(Route::Heists, |navigation| navigation.route().clone());
    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, target.path()))
        .json(CreatedHeist {
            href: Route::Heist(id.clone()).path(),
            id,
        }))
}

/// One heist with its countdown.
#[utoipa::path(
    get,
    path = "/heists/{id}",
    params(("id" = String, Path, description = "Heist identifier")),
    tags = ["heists"],
    responses(
        (status = 200, description = "Heist detail page", body = HeistDetailPage),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[get("/heists/{id}", wrap = "Guarded::dashboard()")]
pub async fn heist_detail(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
    id: web::Path<String>,
) -> web::Json<HeistDetailPage> {
    let watch = HeistWatch::new(state.documents.clone());
    watch.watch(Some(HeistId::new(id.into_inner())));
    let lookup = settle(&state, watch.settled(), || watch.state()).await;
    web::Json(HeistDetailPage {
        navbar: NavbarView::new(auth.user()),
        page: HeistPage::from_lookup(&lookup, state.clock.utc()),
    })
}

#[cfg(test)]
mod tests;
