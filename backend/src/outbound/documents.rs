//! In-memory `DocumentStore` adapter with live snapshot push.
//!
//! Every subscription receives the current snapshot immediately and a fresh
//! snapshot after each write that touches its collection. Server-time
//! sentinels resolve against one reading of the injected clock per write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::document::{Document, Fields, Predicate, matches_all, resolve_server_time};
use crate::domain::ports::{
    DocumentSnapshot, DocumentStore, DocumentStoreError, DocumentSubscription, QuerySnapshot,
    QuerySubscription, Subscription, Unsubscribe,
};

type QueryFeed = UnboundedSender<Result<QuerySnapshot, DocumentStoreError>>;
type DocumentFeed = UnboundedSender<Result<DocumentSnapshot, DocumentStoreError>>;

enum Listener {
    Query {
        collection: String,
        predicates: Vec<Predicate>,
        feed: QueryFeed,
    },
    Document {
        collection: String,
        id: String,
        feed: DocumentFeed,
    },
}

impl Listener {
    fn collection(&self) -> &str {
        match self {
            Self::Query { collection, .. } | Self::Document { collection, .. } => collection,
        }
    }

    /// Push the current view; `false` once the subscriber has gone away.
    fn push(&self, documents: &[Document]) -> bool {
        match self {
            Self::Query {
                predicates, feed, ..
            } => feed.send(Ok(query(documents, predicates))).is_ok(),
            Self::Document { id, feed, .. } => feed.send(Ok(find(documents, id))).is_ok(),
        }
    }

    fn fail(&self, error: DocumentStoreError) {
        let delivered = match self {
            Self::Query { feed, .. } => feed.send(Err(error)).is_ok(),
            Self::Document { feed, .. } => feed.send(Err(error)).is_ok(),
        };
        if !delivered {
            debug!(collection = self.collection(), "listener gone before failure");
        }
    }
}

fn query(documents: &[Document], predicates: &[Predicate]) -> QuerySnapshot {
    documents
        .iter()
        .filter(|document| matches_all(predicates, &document.fields))
        .cloned()
        .collect()
}

fn find(documents: &[Document], id: &str) -> DocumentSnapshot {
    documents.iter().find(|document| document.id == id).cloned()
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, Vec<Document>>,
    listeners: HashMap<u64, Listener>,
    next_listener: u64,
    offline: bool,
}

impl StoreState {
    fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn register(&mut self, listener: Listener) -> u64 {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, listener);
        id
    }

    fn notify(&mut self, collection: &str) {
        let documents = self.collections.get(collection).cloned().unwrap_or_default();
        self.listeners
            .retain(|_, listener| listener.collection() != collection || listener.push(&documents));
    }

    fn upsert(&mut self, collection: &str, document: Document) {
        let documents = self.collections.entry(collection.to_owned()).or_default();
        match documents.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }
}

/// Document store held entirely in memory.
///
/// Cloning yields another handle onto the same documents.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<StoreState>>,
}

impl MemoryDocumentStore {
    /// Empty store reading server time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// Simulate losing or regaining the backend.
    ///
    /// Going offline fails every open subscription with
    /// [`DocumentStoreError::Unavailable`] and closes it. While offline,
    /// writes fail and new subscriptions receive the same error.
    pub fn set_offline(&self, offline: bool) {
        let mut state = self.lock();
        state.offline = offline;
        if offline {
            let listeners = std::mem::take(&mut state.listeners);
            drop(state);
            warn!(subscriptions = listeners.len(), "document store went offline");
            for listener in listeners.values() {
                listener.fail(DocumentStoreError::unavailable("backend offline"));
            }
        }
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unsubscribe_hook(&self, id: u64) -> Unsubscribe {
        let state: Weak<Mutex<StoreState>> = Arc::downgrade(&self.state);
        Unsubscribe::new(move || {
            if let Some(state) = state.upgrade() {
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                guard.listeners.remove(&id);
                debug!(listener = id, "document subscription closed");
            }
        })
    }

    fn write(&self, collection: &str, id: String, fields: Fields) -> Result<(), DocumentStoreError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        if state.offline {
            return Err(DocumentStoreError::unavailable("backend offline"));
        }
        let fields = resolve_server_time(fields, now);
        state.upsert(collection, Document { id, fields });
        state.notify(collection);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn subscribe_query(&self, collection: &str, predicates: Vec<Predicate>) -> QuerySubscription {
        let mut state = self.lock();
        if state.offline {
            let (feed, subscription) = Subscription::channel(Unsubscribe::noop());
            if feed
                .send(Err(DocumentStoreError::unavailable("backend offline")))
                .is_err()
            {
                debug!(collection, "offline subscription dropped");
            }
            return subscription;
        }
        let (feed, receiver) = tokio::sync::mpsc::unbounded_channel();
        if feed
            .send(Ok(query(state.documents(collection), &predicates)))
            .is_err()
        {
            debug!(collection, "initial query snapshot undelivered");
        }
        let id = state.register(Listener::Query {
            collection: collection.to_owned(),
            predicates,
            feed,
        });
        drop(state);
        Subscription::new(receiver, self.unsubscribe_hook(id))
    }

    fn subscribe_document(&self, collection: &str, id: &str) -> DocumentSubscription {
        let mut state = self.lock();
        if state.offline {
            let (feed, subscription) = Subscription::channel(Unsubscribe::noop());
            if feed
                .send(Err(DocumentStoreError::unavailable("backend offline")))
                .is_err()
            {
                debug!(collection, "offline subscription dropped");
            }
            return subscription;
        }
        let (feed, receiver) = tokio::sync::mpsc::unbounded_channel();
        if feed.send(Ok(find(state.documents(collection), id))).is_err() {
            debug!(collection, id, "initial document snapshot undelivered");
        }
        let listener = state.register(Listener::Document {
            collection: collection.to_owned(),
            id: id.to_owned(),
            feed,
        });
        drop(state);
        Subscription::new(receiver, self.unsubscribe_hook(listener))
    }

    async fn add_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<String, DocumentStoreError> {
        let id = Uuid::new_v4().simple().to_string();
        self.write(collection, id.clone(), fields)?;
        debug!(collection, document_id = %id, "document added");
        Ok(id)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError> {
        self.write(collection, id.to_owned(), fields)?;
        debug!(collection, document_id = id, "document set");
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError> {
        let state = self.lock();
        if state.offline {
            return Err(DocumentStoreError::unavailable("backend offline"));
        }
        Ok(state.documents(collection).to_vec())
    }
}
