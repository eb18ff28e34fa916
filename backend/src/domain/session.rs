//! Authentication session store.
//!
//! [`AuthSession`] subscribes to an [`AuthProvider`] and republishes its
//! notifications as an [`AuthState`]. Consumers are handed the session
//! explicitly; there is no ambient auth context.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::User;
use super::liveness::Liveness;
use super::ports::AuthProvider;

/// Published authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// Signed-in user, `None` when signed out.
    pub user: Option<User>,
    /// `true` until the provider's first notification arrives.
    pub loading: bool,
}

impl AuthState {
    /// State before the provider has reported anything.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    /// Resolved state for `user`.
    #[must_use]
    pub fn resolved(user: Option<User>) -> Self {
        Self {
            user,
            loading: false,
        }
    }
}

/// Live view of one auth client's sign-in state.
///
/// `loading` flips to `false` on the first notification and never returns
/// to `true`. Dropping the session unsubscribes from the provider exactly
/// once.
pub struct AuthSession {
    provider: Arc<dyn AuthProvider>,
    state: watch::Receiver<AuthState>,
    liveness: Liveness,
}

impl AuthSession {
    /// Subscribe to `provider` and start publishing its state.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(provider: Arc<dyn AuthProvider>) -> Self {
        let (sender, state) = watch::channel(AuthState::loading());
        let mut subscription = provider.subscribe();
        let liveness = Liveness::new();
        let guard = liveness.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = guard.revoked() => break,
                    next = subscription.next() => {
                        let Some(user) = next else { break };
                        debug!(signed_in = user.is_some(), "auth state changed");
                        if guard
                            .apply(|| sender.send_replace(AuthState::resolved(user)))
                            .is_none()
                        {
                            break;
                        }
                    }
                }
            }
            subscription.unsubscribe();
        });
        Self {
            provider,
            state,
            liveness,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Receiver observing every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Wait until the provider has reported, then return the state.
    ///
    /// Returns the last known state if the provider stops notifying first.
    pub async fn resolved(&self) -> AuthState {
        let mut receiver = self.state.clone();
        match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Client backing this session.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        self.liveness.revoke();
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
