//! Shared HTTP adapter state.
//!
//! Handlers receive this state through `web::Data` and depend only on
//! domain ports, so tests can run against the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;

use crate::domain::ports::{AuthConnector, DocumentStore, DraftStores};

/// Longest a request waits for a live query or the auth client to report.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameter object bundling the port implementations used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Opens one auth client per request.
    pub auth: Arc<dyn AuthConnector>,
    /// Heists and member profiles.
    pub documents: Arc<dyn DocumentStore>,
    /// Per-member draft slots.
    pub drafts: Arc<dyn DraftStores>,
    /// Source of "now" for filters and countdowns.
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Opens a per-request auth client.
    pub auth: Arc<dyn AuthConnector>,
    /// Shared heist and profile store.
    pub documents: Arc<dyn DocumentStore>,
    /// Per-member draft slots.
    pub drafts: Arc<dyn DraftStores>,
    /// Source of "now" for filters and countdowns.
    pub clock: Arc<dyn Clock>,
    /// Bound on waiting for a snapshot before rendering a loading view.
    pub settle_timeout: Duration,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use pocket_heist::inbound::http::state::{HttpState, HttpStatePorts};
    /// use pocket_heist::outbound::{MemoryAuthDirectory, MemoryDocumentStore, MemoryDraftStores};
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let state = HttpState::new(HttpStatePorts {
    ///     auth: Arc::new(MemoryAuthDirectory::new()),
    ///     documents: Arc::new(MemoryDocumentStore::new(clock.clone())),
    ///     drafts: Arc::new(MemoryDraftStores::new()),
    ///     clock,
    /// });
    /// assert!(!state.settle_timeout.is_zero());
    /// ```
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            auth,
            documents,
            drafts,
            clock,
        } = ports;
        Self {
            auth,
            documents,
            drafts,
            clock,
            settle_timeout: SETTLE_TIMEOUT,
        }
    }

    /// Replace the settle timeout.
    #[must_use]
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }
}
