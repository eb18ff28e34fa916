//! Server configuration: layered application settings and the assembled
//! [`ServerConfig`] handed to [`super::create_server`].

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite, time::Duration};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::inbound::http::session_config::SessionSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL_HOURS: u32 = 12;

/// Application settings loaded via OrthoConfig from CLI, env and files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "POCKET_HEIST")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Directory for file-backed drafts; drafts stay in memory when unset.
    pub draft_dir: Option<PathBuf>,
    /// Lifetime of the session cookie in hours.
    pub session_ttl_hours: Option<u32>,
}

impl AppSettings {
    /// Configured bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// Returns [`AddrParseError`] when the configured value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    /// Session cookie lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        let hours = self
            .session_ttl_hours
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        Duration::hours(i64::from(hours))
    }
}

/// Everything the server needs besides the ports.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Combine validated session settings with a bind address.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            session_ttl: Duration::hours(i64::from(DEFAULT_SESSION_TTL_HOURS)),
            bind_addr,
        }
    }

    /// Override the session cookie lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
