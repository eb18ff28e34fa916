//! Pocket Heist entry-point: loads settings, wires adapters, runs the server.

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use pocket_heist::inbound::http::health::HealthState;
use pocket_heist::inbound::http::session_config::{
    BuildMode, key_fingerprint, session_settings_from_env,
};
use pocket_heist::server::{AppSettings, ServerConfig, build_ports, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        key = %key_fingerprint(&session.key),
        cookie_secure = session.cookie_secure,
        "session settings loaded"
    );

    let ports = build_ports(Arc::new(DefaultClock), settings.draft_dir.as_deref())?;
    let config = ServerConfig::new(session, bind_addr).with_session_ttl(settings.session_ttl());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config, ports)?;
    info!(%bind_addr, "pocket heist listening");

    let outcome = server.await;
    health_state.mark_draining();
    info!("server stopped");
    outcome
}
