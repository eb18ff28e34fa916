//! Wire-level messages for the heist feed.
//!
//! Clients receive one [`HeistSection`](crate::domain::views::HeistSection)
//! JSON object per update and may switch filters at any time.

use serde::Deserialize;

use crate::domain::HeistFilter;

/// Query string of the upgrade request: `/ws/heists?filter=assigned`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Initial filter; `active` when absent.
    pub filter: Option<String>,
}

/// Client request selecting another filter: `{"filter":"expired"}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
    /// Filter to switch to.
    pub filter: HeistFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"filter":"expired"}"#, Some(HeistFilter::Expired))]
    #[case(r#"{"filter":"stale"}"#, None)]
    #[case(r#"{"filter":"active","extra":1}"#, None)]
    #[case("not-json", None)]
    fn filter_requests_parse_strictly(#[case] raw: &str, #[case] expected: Option<HeistFilter>) {
        let parsed = serde_json::from_str::<FilterRequest>(raw).ok().map(|r| r.filter);
        assert_eq!(parsed, expected);
    }
}
