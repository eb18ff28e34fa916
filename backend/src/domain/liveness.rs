//! Liveness token guarding subscription callbacks.
//!
//! Every state mutation driven by a subscription goes through
//! [`Liveness::apply`], which checks the token under a gate. Revocation takes
//! the same gate, so once [`Liveness::revoke`] returns no further mutation
//! can land, including one that was racing with it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Revocable permission to mutate watcher state.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl Liveness {
    /// Create a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run `mutate` if the token is still live.
    ///
    /// Returns `None` without running it once revoked.
    #[must_use]
    pub fn apply<T>(&self, mutate: impl FnOnce() -> T) -> Option<T> {
        let _gate = self.lock();
        if self.token.is_cancelled() {
            return None;
        }
        Some(mutate())
    }

    /// Revoke the token; later [`Liveness::apply`] calls are no-ops.
    pub fn revoke(&self) {
        let _gate = self.lock();
        self.token.cancel();
    }

    /// Whether the token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the token is revoked.
    pub async fn revoked(&self) {
        self.token.cancelled().await;
    }
}
