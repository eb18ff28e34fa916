//! Heist detail page.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Avatar, status_label};
use crate::domain::Heist;
use crate::domain::heist_watch::HeistLookup;

const LOAD_FAILED: &str = "There was an error loading the heist details. Please try again.";
const NOT_FOUND: &str = "The heist you're looking for doesn't exist.";

/// Details of a found heist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeistDetail {
    /// Heist identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Countdown such as `1d 2h 3m 4s`, or `Expired`.
    pub time_remaining: String,
    /// Whether the deadline has passed.
    pub expired: bool,
    /// Assignee.
    pub assigned_to: Avatar,
    /// Creator.
    pub created_by: Avatar,
    /// Mission details.
    pub description: String,
    /// Deadline in long form.
    pub deadline: String,
    /// `Success` or `Failure` once decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

impl HeistDetail {
    /// Detail view of `heist` as of `now`.
    #[must_use]
    pub fn new(heist: &Heist, now: DateTime<Utc>) -> Self {
        Self {
            id: heist.id.to_string(),
            title: heist.title.clone(),
            time_remaining: time_remaining(heist.deadline, now),
            expired: heist.deadline < now,
            assigned_to: Avatar::for_name(&heist.assigned_to_codename),
            created_by: Avatar::for_name(&heist.created_by_codename),
            description: heist.description.clone(),
            deadline: long_deadline(heist.deadline),
            status: heist.final_status.map(status_label),
        }
    }
}

/// What the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum HeistPage {
    /// Waiting for the first snapshot.
    Loading,
    /// The read failed.
    Error {
        /// Message shown in place of the heist.
        message: &'static str,
    },
    /// No heist has the requested identifier.
    NotFound {
        /// Message shown in place of the heist.
        message: &'static str,
    },
    /// The heist exists.
    Found(Box<HeistDetail>),
}

impl HeistPage {
    /// Page state for a lookup as of `now`.
    #[must_use]
    pub fn from_lookup(lookup: &HeistLookup, now: DateTime<Utc>) -> Self {
        if lookup.loading {
            return Self::Loading;
        }
        if lookup.error.is_some() {
            return Self::Error {
                message: LOAD_FAILED,
            };
        }
        match &lookup.heist {
            Some(heist) => Self::Found(Box::new(HeistDetail::new(heist, now))),
            None => Self::NotFound { message: NOT_FOUND },
        }
    }
}

/// Countdown to `deadline`.
///
/// Zero components are omitted; seconds are shown when nothing else is.
#[must_use]
pub fn time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let distance = (deadline - now).num_milliseconds();
    if distance < 0 {
        return "Expired".to_owned();
    }
    let total_seconds = distance.div_euclid(1_000);
    let days = total_seconds.div_euclid(86_400);
    let hours = total_seconds.rem_euclid(86_400).div_euclid(3_600);
    let minutes = total_seconds.rem_euclid(3_600).div_euclid(60);
    let seconds = total_seconds.rem_euclid(60);

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

/// Deadline such as `Wednesday, January 7, 2026 at 09:30 AM`.
#[must_use]
pub fn long_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%A, %B %-d, %Y at %I:%M %p").to_string()
}
