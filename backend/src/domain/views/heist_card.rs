//! Dashboard heist card.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::status_label;
use crate::domain::{Heist, Route};

const NO_DESCRIPTION: &str = "(No description)";

/// Summary card for one heist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeistCard {
    /// Heist identifier.
    pub id: String,
    /// Title, linked to the detail page.
    pub title: String,
    /// Detail page path.
    pub href: String,
    /// Description or a placeholder when empty.
    pub description: String,
    /// Creator codename shown after `By:`.
    pub created_by: String,
    /// Assignee codename shown after `To:`.
    pub assigned_to: String,
    /// `{n}h left` or `Expired`.
    pub hours_left: String,
    /// Deadline as `Mon D, YYYY`.
    pub deadline: String,
    /// `Success` or `Failure` once decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

impl HeistCard {
    /// Card for `heist` as of `now`.
    #[must_use]
    pub fn new(heist: &Heist, now: DateTime<Utc>) -> Self {
        let description = if heist.description.is_empty() {
            NO_DESCRIPTION.to_owned()
        } else {
            heist.description.clone()
        };
        Self {
            id: heist.id.to_string(),
            title: heist.title.clone(),
            href: Route::Heist(heist.id.clone()).path(),
            description,
            created_by: heist.created_by_codename.clone(),
            assigned_to: heist.assigned_to_codename.clone(),
            hours_left: hours_left_label(heist.deadline, now),
            deadline: short_deadline(heist.deadline),
            status: heist.final_status.map(status_label),
        }
    }
}

/// Whole hours until `deadline`, or `Expired` once none remain.
#[must_use]
pub fn hours_left_label(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = deadline - now;
    let hours = remaining.num_milliseconds().div_euclid(3_600_000);
    if hours > 0 {
        format!("{hours}h left")
    } else {
        "Expired".to_owned()
    }
}

/// Deadline formatted as `Mon D, YYYY`.
#[must_use]
pub fn short_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%b %-d, %Y").to_string()
}
