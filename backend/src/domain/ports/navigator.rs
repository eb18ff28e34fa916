//! Port abstraction for client-side navigation.
use std::sync::Mutex;

use crate::domain::Route;

/// Performs navigation on behalf of guards and forms.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Navigate to `route`, adding a history entry.
    fn push(&self, route: Route);

    /// Navigate to `route`, replacing the current history entry.
    fn replace(&self, route: Route);
}

/// Navigation request observed by a [`RecordingNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// A `push` call.
    Push(Route),
    /// A `replace` call.
    Replace(Route),
}

impl Navigation {
    /// Target route.
    #[must_use]
    pub fn route(&self) -> &Route {
        match self {
            Self::Push(route) | Self::Replace(route) => route,
        }
    }
}

/// Navigator that records requests instead of performing them.
///
/// The HTTP adapter uses it to turn a guard's redirect into a response.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    requests: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, navigation: Navigation) {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(navigation);
    }

    /// Requests observed so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Navigation> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Most recent request.
    #[must_use]
    pub fn last(&self) -> Option<Navigation> {
        self.requests().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) {
        self.record(Navigation::Push(route));
    }

    fn replace(&self, route: Route) {
        self.record(Navigation::Replace(route));
    }
}
