//! HTTP inbound adapter serving the heist board as JSON view models.
//!
//! Handlers stay thin: they resolve the visitor through [`guard::Guarded`],
//! hand ports from [`state::HttpState`] to domain forms and watches, and map
//! navigation requests onto `303 See Other` responses.

pub mod accounts;
pub mod drafts;
pub mod error;
pub mod guard;
pub mod health;
pub mod heists;
pub mod profiles;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use crate::domain::ApiResult;
