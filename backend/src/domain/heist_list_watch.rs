//! Live watch over a filtered heist query.
//!
//! The watch follows the auth session: it stays idle while auth is loading
//! or signed out and (re)subscribes whenever the user or the selected filter
//! changes. Filter predicates compare against the clock reading taken when
//! the subscription opens.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::document::HEISTS_COLLECTION;
use super::liveness::Liveness;
use super::ports::{DocumentStore, QuerySnapshot, QuerySubscription};
use super::{AuthState, Heist, HeistFilter, User};

/// Published state of a [`HeistListWatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeistList {
    /// Filter whose query produced `heists`.
    pub filter: HeistFilter,
    /// Matching heists in store order.
    pub heists: Vec<Heist>,
    /// `true` until the first snapshot or error.
    pub loading: bool,
}

impl HeistList {
    /// Empty list for `filter` awaiting its first snapshot.
    #[must_use]
    pub const fn loading(filter: HeistFilter) -> Self {
        Self {
            filter,
            heists: Vec::new(),
            loading: true,
        }
    }

    /// Settled list for `filter`.
    #[must_use]
    pub const fn settled(filter: HeistFilter, heists: Vec<Heist>) -> Self {
        Self {
            filter,
            heists,
            loading: false,
        }
    }
}

type SubscriptionKey = (User, HeistFilter);

/// Watches the heists matching a filter for the signed-in user.
pub struct HeistListWatch {
    state: Arc<watch::Sender<HeistList>>,
    filter: watch::Sender<HeistFilter>,
    driver: Liveness,
}

impl HeistListWatch {
    /// Start following `auth` with the initial `filter`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        auth: watch::Receiver<AuthState>,
        filter: HeistFilter,
    ) -> Self {
        let (state, _) = watch::channel(HeistList::loading(filter));
        let state = Arc::new(state);
        let (filter_sender, filter_receiver) = watch::channel(filter);
        let driver = Liveness::new();
        tokio::spawn(drive(
            Driver {
                store,
                clock,
                state: Arc::clone(&state),
                liveness: driver.clone(),
            },
            auth,
            filter_receiver,
        ));
        Self {
            state,
            filter: filter_sender,
            driver,
        }
    }

    /// Select a different filter.
    pub fn set_filter(&self, filter: HeistFilter) {
        self.filter.send_if_modified(|current| {
            let changed = *current != filter;
            *current = filter;
            changed
        });
    }

    /// Currently selected filter.
    ///
    /// May run ahead of [`HeistList::filter`] until the new query answers.
    #[must_use]
    pub fn filter(&self) -> HeistFilter {
        *self.filter.borrow()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HeistList {
        self.state.borrow().clone()
    }

    /// Receiver observing every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HeistList> {
        self.state.subscribe()
    }

    /// Wait until the list has finished loading.
    pub async fn settled(&self) -> HeistList {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(|list| !list.loading).await {
            Ok(list) => list.clone(),
            Err(_) => self.state(),
        }
    }
}

impl Drop for HeistListWatch {
    fn drop(&mut self) {
        self.driver.revoke();
    }
}

struct Driver {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<HeistList>>,
    liveness: Liveness,
}

impl Driver {
    fn open(&self, (user, filter): &SubscriptionKey) -> Liveness {
        let predicates = filter.predicates(&user.id, self.clock.utc());
        debug!(user_id = %user.id, %filter, "subscribing to heists");
        let subscription = self.store.subscribe_query(HEISTS_COLLECTION, predicates);
        let liveness = Liveness::new();
        tokio::spawn(pump(
            *filter,
            subscription,
            Arc::clone(&self.state),
            liveness.clone(),
        ));
        liveness
    }
}

fn desired_key(auth: &AuthState, filter: HeistFilter) -> Option<SubscriptionKey> {
    if auth.loading {
        return None;
    }
    auth.user.clone().map(|user| (user, filter))
}

async fn drive(
    driver: Driver,
    mut auth: watch::Receiver<AuthState>,
    mut filter: watch::Receiver<HeistFilter>,
) {
    let mut key: Option<SubscriptionKey> = None;
    let mut current: Option<Liveness> = None;
    loop {
        let desired = desired_key(&auth.borrow_and_update(), *filter.borrow_and_update());
        if desired != key {
            if let Some(previous) = current.take() {
                previous.revoke();
            }
            current = desired.as_ref().map(|next| driver.open(next));
            key = desired;
        }
        tokio::select! {
            () = driver.liveness.revoked() => break,
            changed = auth.changed() => if changed.is_err() { break },
            changed = filter.changed() => if changed.is_err() { break },
        }
    }
    if let Some(previous) = current {
        previous.revoke();
    }
}

fn decode(filter: HeistFilter, snapshot: QuerySnapshot) -> Vec<Heist> {
    snapshot
        .iter()
        .filter_map(|document| match Heist::try_from(document) {
            Ok(heist) => Some(heist),
            Err(err) => {
                warn!(%filter, error = %err, "skipping undecodable heist");
                None
            }
        })
        .collect()
}

async fn pump(
    filter: HeistFilter,
    mut subscription: QuerySubscription,
    state: Arc<watch::Sender<HeistList>>,
    liveness: Liveness,
) {
    loop {
        let next = tokio::select! {
            () = liveness.revoked() => break,
            next = subscription.next() => next,
        };
        match next {
            Some(Ok(snapshot)) => {
                let heists = decode(filter, snapshot);
                if liveness
                    .apply(|| state.send_replace(HeistList::settled(filter, heists)))
                    .is_none()
                {
                    break;
                }
            }
            Some(Err(err)) => {
                error!(%filter, error = %err, "failed to fetch heists");
                if liveness
                    .apply(|| state.send_replace(HeistList::settled(filter, Vec::new())))
                    .is_none()
                {
                    debug!(%filter, "revoked before clearing the list");
                }
                break;
            }
            None => break,
        }
    }
    subscription.unsubscribe();
}
