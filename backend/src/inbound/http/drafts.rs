//! Create-heist draft slot for the signed-in member.
//!
//! ```text
//! GET    /drafts/heist   200 with the draft, 204 when none is stored
//! PUT    /drafts/heist   {"title":"Stapler","description":"","assignedTo":"","assignedToCodename":""}
//! DELETE /drafts/heist
//! ```
//!
//! Each member owns one draft store; the slot inside it is the single
//! global draft key.

use std::sync::Arc;

use actix_web::{HttpResponse, delete, get, put, web};
use tracing::error;

use super::guard::{CurrentAuth, Guarded};
use super::state::HttpState;
use crate::domain::forms::DraftAutosave;
use crate::domain::ports::DraftStore;
use crate::domain::{ApiResult, Error, HeistDraft, UserId};

const DRAFTS_UNAVAILABLE: &str = "Draft storage unavailable";

/// Open the draft store owned by `owner`.
pub(crate) fn open_drafts(state: &HttpState, owner: &UserId) -> Result<Arc<dyn DraftStore>, Error> {
    state.drafts.open(owner).map_err(|err| {
        error!(error = %err, user_id = %owner, "failed to open draft store");
        Error::service_unavailable(DRAFTS_UNAVAILABLE)
    })
}

fn autosave_for(state: &HttpState, auth: &CurrentAuth) -> Result<DraftAutosave, Error> {
    let user = auth.require_user()?;
    open_drafts(state, &user.id).map(DraftAutosave::new)
}

/// Read the saved draft.
#[utoipa::path(
    get,
    path = "/drafts/heist",
    tags = ["drafts"],
    responses(
        (status = 200, description = "Saved draft", body = HeistDraft),
        (status = 204, description = "No draft saved"),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[get("/drafts/heist", wrap = "Guarded::dashboard()")]
pub async fn get_draft(state: web::Data<HttpState>, auth: CurrentAuth) -> ApiResult<HttpResponse> {
    let autosave = autosave_for(&state, &auth)?;
    Ok(match autosave.load() {
        Some(draft) => HttpResponse::Ok().json(draft),
        None => HttpResponse::NoContent().finish(),
    })
}

/// Replace the saved draft.
#[utoipa::path(
    put,
    path = "/drafts/heist",
    request_body = HeistDraft,
    tags = ["drafts"],
    responses(
        (status = 204, description = "Draft saved"),
        (status = 303, description = "Visitors are sent to /login"),
        (status = 503, description = "Draft storage unavailable", body = Error)
    )
)]
#[put("/drafts/heist", wrap = "Guarded::dashboard()")]
pub async fn put_draft(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
    payload: web::Json<HeistDraft>,
) -> ApiResult<HttpResponse> {
    let autosave = autosave_for(&state, &auth)?;
    autosave.save_now(&payload).map_err(|err| {
        error!(error = %err, "failed to save heist draft");
        Error::service_unavailable(DRAFTS_UNAVAILABLE)
    })?;
    Ok(HttpResponse::NoContent().finish())
}

/// Discard the saved draft.
#[utoipa::path(
    delete,
    path = "/drafts/heist",
    tags = ["drafts"],
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[delete("/drafts/heist", wrap = "Guarded::dashboard()")]
pub async fn delete_draft(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
) -> ApiResult<HttpResponse> {
    autosave_for(&state, &auth)?.clear();
    Ok(HttpResponse::NoContent().finish())
}
