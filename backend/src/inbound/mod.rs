//! Inbound adapters that translate HTTP requests and WebSocket frames into
//! domain calls while keeping framework details at the edge.
//!
//! Request/response handlers live under [`http`]; the live heist feed lives
//! under [`ws`] and reuses the HTTP session and guard.

pub mod http;
pub mod ws;
