//! Port abstraction for the live document store.
//!
//! Queries and single-document reads are subscriptions: the store pushes a
//! full snapshot when the subscription opens and again whenever the result
//! changes. A push carrying an error ends the useful life of the
//! subscription.
use async_trait::async_trait;

use crate::domain::document::{Document, Fields, Predicate};

use super::{Subscription, define_port_error};

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// The store could not be reached.
        Unavailable { message: String } => "document store unavailable: {message}",
        /// The store refused the operation.
        PermissionDenied { message: String } => "document store denied access: {message}",
        /// A query or write failed while executing.
        Query { message: String } => "document store query failed: {message}",
    }
}

/// Current contents of a query, in store order.
pub type QuerySnapshot = Vec<Document>;

/// Current contents of a single document; `None` when it does not exist.
pub type DocumentSnapshot = Option<Document>;

/// Push stream for a query.
pub type QuerySubscription = Subscription<Result<QuerySnapshot, DocumentStoreError>>;

/// Push stream for a single document.
pub type DocumentSubscription = Subscription<Result<DocumentSnapshot, DocumentStoreError>>;

/// Port for reading and writing documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to documents in `collection` matching every predicate.
    fn subscribe_query(&self, collection: &str, predicates: Vec<Predicate>) -> QuerySubscription;

    /// Subscribe to one document by identifier.
    fn subscribe_document(&self, collection: &str, id: &str) -> DocumentSubscription;

    /// Insert a document, returning its store-assigned identifier.
    ///
    /// Server-time sentinels in `fields` resolve against one clock reading.
    async fn add_document(&self, collection: &str, fields: Fields)
    -> Result<String, DocumentStoreError>;

    /// Create or replace the document at `id`.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError>;

    /// Read every document in `collection` once.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError>;
}
