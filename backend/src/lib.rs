//! Pocket Heist: a team heist board with live dashboards.
//!
//! The [`domain`] owns heists, members, forms and watches behind ports;
//! [`outbound`] adapters implement those ports in memory; [`inbound`]
//! exposes them over HTTP and WebSocket; [`server`] wires it all together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
