//! Request middleware shared by every route.
//!
//! Route guards live with the HTTP adapter in
//! [`crate::inbound::http::guard`].

pub mod trace;

pub use trace::Trace;
