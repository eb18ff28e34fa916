//! Route guards for the public and dashboard page groups.

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::ports::Navigator;
use super::{AuthState, Route};

/// Which page group a guard protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// Signed-in pages; signed-out visitors go to `/login`.
    Dashboard,
    /// Sign-in and sign-up pages; signed-in users go to `/heists`.
    Public,
}

/// What the guarded page should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Auth is unresolved or a redirect is pending.
    Loading,
    /// Render the guarded content.
    Content,
}

/// Redirects visitors who do not belong on a page group.
///
/// A redirect is issued through [`Navigator::replace`] exactly once per
/// resolved state; re-evaluating the same state does not navigate again.
pub struct RouteGuard {
    kind: GuardKind,
    navigator: Arc<dyn Navigator>,
    issued: Mutex<Option<Route>>,
}

impl RouteGuard {
    /// Guard for the dashboard page group.
    #[must_use]
    pub fn dashboard(navigator: Arc<dyn Navigator>) -> Self {
        Self::new(GuardKind::Dashboard, navigator)
    }

    /// Guard for the public page group.
    #[must_use]
    pub fn public(navigator: Arc<dyn Navigator>) -> Self {
        Self::new(GuardKind::Public, navigator)
    }

    /// Guard of the given kind.
    #[must_use]
    pub fn new(kind: GuardKind, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            kind,
            navigator,
            issued: Mutex::new(None),
        }
    }

    /// Guard kind.
    #[must_use]
    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    /// Evaluate `state`, redirecting when the visitor does not belong.
    #[must_use]
    pub fn evaluate(&self, state: &AuthState) -> GuardView {
        if state.loading {
            return GuardView::Loading;
        }
        let target = match (self.kind, state.user.is_some()) {
            (GuardKind::Dashboard, false) => Some(Route::Login),
            (GuardKind::Public, true) => Some(Route::Heists),
            _ => None,
        };
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(target) = target else {
            *issued = None;
            return GuardView::Content;
        };
        if issued.as_ref() != Some(&target) {
            debug!(kind = ?self.kind, route = %target, "guard redirecting");
            self.navigator.replace(target.clone());
            *issued = Some(target);
        }
        GuardView::Loading
    }
}
