//! Assignee options for the create-heist form.

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::guard::{CurrentAuth, Guarded};
use super::state::HttpState;
use crate::domain::forms::load_assignees;
use crate::domain::{ApiResult, Assignees, UserProfile};

/// Members the signed-in user can assign a heist to.
///
/// `message` replaces the picker when nobody can be chosen.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeOptions {
    /// Every other member.
    pub profiles: Vec<UserProfile>,
    /// Empty-state or error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<&Assignees> for AssigneeOptions {
    fn from(value: &Assignees) -> Self {
        let profiles = match value {
            Assignees::Available(profiles) => profiles.clone(),
            Assignees::NoneAvailable | Assignees::LoadFailed => Vec::new(),
        };
        Self {
            profiles,
            message: value.message(),
        }
    }
}

/// Every other member's profile.
#[utoipa::path(
    get,
    path = "/profiles",
    tags = ["heists"],
    responses(
        (status = 200, description = "Assignable members", body = AssigneeOptions),
        (status = 303, description = "Visitors are sent to /login")
    )
)]
#[get("/profiles", wrap = "Guarded::dashboard()")]
pub async fn list_profiles(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
) -> ApiResult<web::Json<AssigneeOptions>> {
    let user = auth.require_user()?;
    let assignees = load_assignees(state.documents.as_ref(), &user.id).await;
    Ok(web::Json(AssigneeOptions::from(&assignees)))
}
