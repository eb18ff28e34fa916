//! Presentation view models.
//!
//! Plain serialisable structs describing what each page shows. Rendering is
//! left to the client; every time-dependent value takes `now` explicitly.

mod avatar;
mod dashboard;
mod heist_card;
mod heist_detail;
mod navbar;

pub use avatar::{Avatar, initials};
pub use dashboard::{
    DashboardView, EMPTY_SECTION_MESSAGE, HeistSection, SKELETON_COUNT, SectionBody,
};
pub use heist_card::{HeistCard, hours_left_label, short_deadline};
pub use heist_detail::{HeistDetail, HeistPage, long_deadline, time_remaining};
pub use navbar::NavbarView;

use super::FinalStatus;

/// Badge text for a final status.
#[must_use]
pub fn status_label(status: FinalStatus) -> &'static str {
    match status {
        FinalStatus::Success => "Success",
        FinalStatus::Failure => "Failure",
    }
}
