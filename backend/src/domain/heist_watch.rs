//! Live watch over a single heist.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{error, warn};

use super::document::HEISTS_COLLECTION;
use super::liveness::Liveness;
use super::ports::{DocumentStore, DocumentStoreError, DocumentSubscription};
use super::{Heist, HeistDecodeError, HeistId};

/// Why a heist could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeistWatchError {
    /// The store failed to deliver the document.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
    /// The stored document is not a valid heist.
    #[error(transparent)]
    Decode(#[from] HeistDecodeError),
}

/// Published state of a [`HeistWatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeistLookup {
    /// The heist, when it exists and decoded.
    pub heist: Option<Heist>,
    /// `true` until the first push for the current identifier.
    pub loading: bool,
    /// Delivery or decode failure.
    pub error: Option<HeistWatchError>,
}

impl HeistLookup {
    fn loading() -> Self {
        Self {
            heist: None,
            loading: true,
            error: None,
        }
    }

    fn settled(heist: Option<Heist>) -> Self {
        Self {
            heist,
            loading: false,
            error: None,
        }
    }

    fn failed(error: HeistWatchError) -> Self {
        Self {
            heist: None,
            loading: false,
            error: Some(error),
        }
    }
}

/// Watches one heist by identifier.
///
/// Switching identifier tears down the previous subscription before the
/// state resets, so a late push for the old identifier is never published.
pub struct HeistWatch {
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<HeistLookup>>,
    current: Mutex<Option<Liveness>>,
}

impl HeistWatch {
    /// Create an idle watch over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (sender, _) = watch::channel(HeistLookup::loading());
        Self {
            store,
            state: Arc::new(sender),
            current: Mutex::new(None),
        }
    }

    /// Watch `id`, or nothing when `None`.
    ///
    /// Must be called from within a tokio runtime when `id` is present.
    pub fn watch(&self, id: Option<HeistId>) {
        self.teardown();
        let Some(id) = id else {
            self.state.send_replace(HeistLookup::settled(None));
            return;
        };
        self.state.send_replace(HeistLookup::loading());

        let liveness = Liveness::new();
        let subscription = self.store.subscribe_document(HEISTS_COLLECTION, id.as_str());
        tokio::spawn(pump(
            id,
            subscription,
            Arc::clone(&self.state),
            liveness.clone(),
        ));
        *self.lock_current() = Some(liveness);
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HeistLookup {
        self.state.borrow().clone()
    }

    /// Receiver observing every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HeistLookup> {
        self.state.subscribe()
    }

    /// Wait until the current lookup has finished loading.
    pub async fn settled(&self) -> HeistLookup {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(|lookup| !lookup.loading).await {
            Ok(lookup) => lookup.clone(),
            Err(_) => self.state(),
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Liveness>> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn teardown(&self) {
        if let Some(liveness) = self.lock_current().take() {
            liveness.revoke();
        }
    }
}

impl Drop for HeistWatch {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn pump(
    id: HeistId,
    mut subscription: DocumentSubscription,
    state: Arc<watch::Sender<HeistLookup>>,
    liveness: Liveness,
) {
    loop {
        let next = tokio::select! {
            () = liveness.revoked() => break,
            next = subscription.next() => next,
        };
        let Some(push) = next else { break };
        let (lookup, terminal) = match push {
            Ok(Some(document)) => match Heist::try_from(&document) {
                Ok(heist) => (HeistLookup::settled(Some(heist)), false),
                Err(err) => {
                    warn!(heist_id = %id, error = %err, "stored heist failed to decode");
                    (HeistLookup::failed(err.into()), false)
                }
            },
            Ok(None) => (HeistLookup::settled(None), false),
            Err(err) => {
                error!(heist_id = %id, error = %err, "failed to fetch heist");
                (HeistLookup::failed(err.into()), true)
            }
        };
        if liveness.apply(|| state.send_replace(lookup)).is_none() || terminal {
            break;
        }
    }
    subscription.unsubscribe();
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for the single-heist watch.
    use super::*;
    use crate::domain::document::{Document, FieldValue, Fields};
    use crate::domain::ports::{MockDocumentStore, Subscription, Unsubscribe};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    type Feed = mpsc::UnboundedSender<Result<Option<Document>, DocumentStoreError>>;

    fn heist_document(id: &str, title: &str) -> Document {
        let created = Utc
            .with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
            .single()
            .expect("valid time");
        let fields = Fields::from([
            ("title".to_owned(), FieldValue::from(title)),
            ("description".to_owned(), FieldValue::from("Borrow the stapler")),
            ("createdBy".to_owned(), FieldValue::from("u1")),
            ("createdByCodename".to_owned(), FieldValue::from("SlyFoxDances")),
            ("assignedTo".to_owned(), FieldValue::from("u2")),
            ("assignedToCodename".to_owned(), FieldValue::from("BoldOwlLeaps")),
            ("createdAt".to_owned(), FieldValue::from(created)),
            (
                "deadline".to_owned(),
                FieldValue::from(created + crate::domain::HEIST_DURATION),
            ),
            ("finalStatus".to_owned(), FieldValue::Null),
        ]);
        Document {
            id: id.to_owned(),
            fields,
        }
    }

    fn store_with_feeds(ids: &[&'static str]) -> (MockDocumentStore, Vec<Feed>) {
        let mut store = MockDocumentStore::new();
        let mut feeds = Vec::new();
        for &id in ids {
            let (feed, subscription) = Subscription::channel(Unsubscribe::noop());
            feeds.push(feed);
            store
                .expect_subscribe_document()
                .withf(move |collection, doc_id| collection == "heists" && doc_id == id)
                .times(1)
                .return_once(move |_, _| subscription);
        }
        (store, feeds)
    }

    async fn next_state(receiver: &mut watch::Receiver<HeistLookup>) -> HeistLookup {
        timeout(Duration::from_secs(1), receiver.changed())
            .await
            .expect("state changes")
            .expect("watch alive");
        receiver.borrow_and_update().clone()
    }

    #[rstest]
    #[tokio::test]
    async fn absent_identifier_settles_without_subscribing() {
        let watch = HeistWatch::new(Arc::new(MockDocumentStore::new()));
        watch.watch(None);
        assert_eq!(watch.state(), HeistLookup::settled(None));
    }

    #[rstest]
    #[tokio::test]
    async fn present_document_is_published() {
        let (store, feeds) = store_with_feeds(&["h1"]);
        let watch = HeistWatch::new(Arc::new(store));
        watch.watch(Some(HeistId::new("h1")));
        assert!(watch.state().loading);

        let [feed] = feeds.as_slice() else { panic!("one feed") };
        feed.send(Ok(Some(heist_document("h1", "Stapler run"))))
            .expect("pump listening");

        let lookup = timeout(Duration::from_secs(1), watch.settled())
            .await
            .expect("settles");
        assert_eq!(
            lookup.heist.map(|heist| heist.title),
            Some("Stapler run".to_owned())
        );
        assert!(lookup.error.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_document_settles_empty() {
        let (store, feeds) = store_with_feeds(&["gone"]);
        let watch = HeistWatch::new(Arc::new(store));
        watch.watch(Some(HeistId::new("gone")));
        feeds[0].send(Ok(None)).expect("pump listening");
        let lookup = timeout(Duration::from_secs(1), watch.settled())
            .await
            .expect("settles");
        assert_eq!(lookup, HeistLookup::settled(None));
    }

    #[rstest]
    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let (store, feeds) = store_with_feeds(&["h1"]);
        let watch = HeistWatch::new(Arc::new(store));
        watch.watch(Some(HeistId::new("h1")));
        feeds[0]
            .send(Err(DocumentStoreError::unavailable("offline")))
            .expect("pump listening");
        let lookup = timeout(Duration::from_secs(1), watch.settled())
            .await
            .expect("settles");
        assert!(lookup.heist.is_none());
        assert_eq!(
            lookup.error,
            Some(HeistWatchError::Store(DocumentStoreError::unavailable("offline")))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn switching_identifier_ignores_the_old_subscription() {
        let (store, feeds) = store_with_feeds(&["h1", "h2"]);
        let watch = HeistWatch::new(Arc::new(store));
        let mut receiver = watch.subscribe();

        watch.watch(Some(HeistId::new("h1")));
        watch.watch(Some(HeistId::new("h2")));
        receiver.borrow_and_update();

        // The first pump has been revoked; its push must not land.
        feeds[0].send(Ok(Some(heist_document("h1", "Old")))).ok();
        feeds[1]
            .send(Ok(Some(heist_document("h2", "New"))))
            .expect("second pump listening");

        let lookup = next_state(&mut receiver).await;
        assert_eq!(lookup.heist.map(|heist| heist.title), Some("New".to_owned()));
    }
}
