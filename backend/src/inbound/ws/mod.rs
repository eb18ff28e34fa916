//! WebSocket inbound adapter streaming live heist lists.
//!
//! Responsibilities:
//! - validate upgrade requests (origin check, signed-in member)
//! - start one [`HeistListWatch`] per connection
//! - keep WebSocket framing at the edge of the system

use std::str::FromStr;

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info, warn};
use url::Url;

use crate::domain::{ApiResult, Error, HeistFilter, HeistListWatch};
use crate::inbound::http::guard::{CurrentAuth, Guarded};
use crate::inbound::http::state::HttpState;

mod session;

pub mod messages;

use messages::FeedQuery;

/// Upgrade to a live feed of the member's heists.
///
/// Each update is a `HeistSection` JSON object. Sending
/// `{"filter":"assigned"}` switches the feed to another filter.
#[utoipa::path(
    get,
    path = "/ws/heists",
    params(("filter" = Option<String>, Query, description = "active, assigned or expired")),
    tags = ["heists"],
    responses(
        (status = 101, description = "Switching to the heist feed"),
        (status = 303, description = "Visitors are sent to /login"),
        (status = 400, description = "Unknown filter or malformed Origin", body = Error),
        (status = 403, description = "Origin not allowed", body = Error)
    )
)]
#[get("/ws/heists", wrap = "Guarded::dashboard()")]
pub async fn heist_feed(
    state: web::Data<HttpState>,
    auth: CurrentAuth,
    query: web::Query<FeedQuery>,
    req: HttpRequest,
    stream: Payload,
) -> ApiResult<HttpResponse> {
    let mut origins = req.headers().get_all(ORIGIN);
    let origin = origins.next().ok_or_else(|| {
        warn!("missing Origin header on feed upgrade");
        Error::forbidden("Origin not allowed")
    })?;
    if origins.next().is_some() {
        warn!("multiple Origin headers on feed upgrade");
        return Err(Error::invalid_request("Invalid Origin header"));
    }
    validate_origin(origin, req.connection_info().host())?;

    let filter = match query.into_inner().filter {
        Some(raw) => HeistFilter::from_str(&raw).map_err(|err| {
            Error::invalid_request(err.to_string())
        })?,
        None => HeistFilter::Active,
    };
    let user_id = auth.require_user()?.id.clone();

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|err| {
        error!(error = %err, "feed upgrade failed");
        Error::invalid_request("WebSocket upgrade failed")
    })?;
    let watch = HeistListWatch::start(
        state.documents.clone(),
        state.clock.clone(),
        auth.watch(),
        filter,
    );
    info!(user_id = %user_id, %filter, "heist feed opened");
    let feed = session::HeistFeed::new(auth, watch, state.clock.clone());
    actix_web::rt::spawn(feed.run(session, messages));
    Ok(response)
}

fn validate_origin(header: &HeaderValue, host: &str) -> Result<(), Error> {
    let value = header.to_str().map_err(|err| {
        warn!(error = %err, "Origin header is not valid text");
        Error::invalid_request("Invalid Origin header")
    })?;
    let origin = Url::parse(value).map_err(|err| {
        warn!(error = %err, "Origin header is not a URL");
        Error::invalid_request("Invalid Origin header")
    })?;
    if is_allowed_origin(&origin, host) {
        Ok(())
    } else {
        warn!(origin = value, host, "rejected feed upgrade from foreign origin");
        Err(Error::forbidden("Origin not allowed"))
    }
}

const LOCALHOST: &str = "localhost";

/// Same-origin pages, plus local development servers on an explicit port.
fn is_allowed_origin(origin: &Url, host: &str) -> bool {
    let Some(origin_host) = origin.host_str() else {
        return false;
    };
    if !matches!(origin.scheme(), "http" | "https") {
        return false;
    }
    let authority = match origin.port() {
        Some(port) => format!("{origin_host}:{port}"),
        None => origin_host.to_owned(),
    };
    if authority.eq_ignore_ascii_case(host) {
        return true;
    }
    origin.scheme() == "http"
        && origin_host == LOCALHOST
        && matches!(origin.port(), Some(port) if port != 0)
}

#[cfg(test)]
mod tests;
