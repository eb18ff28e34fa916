//! Dashboard sections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::HeistCard;
use crate::domain::HeistFilter;
use crate::domain::heist_list_watch::HeistList;

/// Placeholders shown while a section loads.
pub const SKELETON_COUNT: usize = 3;

/// Message shown for an empty section.
pub const EMPTY_SECTION_MESSAGE: &str = "No available heists.";

/// Body of one dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SectionBody {
    /// Skeleton placeholders.
    Loading {
        /// Number of placeholders.
        skeletons: usize,
    },
    /// Nothing to show.
    Empty {
        /// Empty-state message.
        message: String,
    },
    /// Cards to render.
    Cards {
        /// One card per heist.
        cards: Vec<HeistCard>,
    },
}

/// One titled dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeistSection {
    /// Filter feeding the section.
    pub filter: HeistFilter,
    /// Section heading.
    pub title: &'static str,
    /// Section content.
    pub body: SectionBody,
}

impl HeistSection {
    /// Section showing `list` as of `now`, titled after the list's filter.
    #[must_use]
    pub fn new(list: &HeistList, now: DateTime<Utc>) -> Self {
        let filter = list.filter;
        let body = if list.loading {
            SectionBody::Loading {
                skeletons: SKELETON_COUNT,
            }
        } else if list.heists.is_empty() {
            SectionBody::Empty {
                message: EMPTY_SECTION_MESSAGE.to_owned(),
            }
        } else {
            SectionBody::Cards {
                cards: list.heists.iter().map(|h| HeistCard::new(h, now)).collect(),
            }
        };
        Self {
            filter,
            title: section_title(filter),
            body,
        }
    }
}

fn section_title(filter: HeistFilter) -> &'static str {
    match filter {
        HeistFilter::Active => "Your Active Heists",
        HeistFilter::Assigned => "Heists You've Assigned",
        HeistFilter::Expired => "All Expired Heists",
    }
}

/// The three dashboard sections in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Active, assigned and expired sections.
    pub sections: Vec<HeistSection>,
}

impl DashboardView {
    /// Build the dashboard from one list per filter.
    ///
    /// `lists` is looked up by filter; a filter without a list shows as
    /// loading.
    #[must_use]
    pub fn new<'a>(lists: impl IntoIterator<Item = &'a HeistList>, now: DateTime<Utc>) -> Self {
        let lists: Vec<&HeistList> = lists.into_iter().collect();
        let sections = HeistFilter::ALL
            .into_iter()
            .map(|filter| {
                lists
                    .iter()
                    .find(|list| list.filter == filter)
                    .map_or_else(
                        || HeistSection::new(&HeistList::loading(filter), now),
                        |list| HeistSection::new(list, now),
                    )
            })
            .collect();
        Self { sections }
    }
}
