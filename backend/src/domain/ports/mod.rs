//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_provider;
mod document_store;
mod draft_store;
mod navigator;
mod subscription;

#[cfg(test)]
pub use auth_provider::{MockAuthConnector, MockAuthProvider};
pub use auth_provider::{AuthConnector, AuthProvider, AuthProviderError};
#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    DocumentSnapshot, DocumentStore, DocumentStoreError, DocumentSubscription, QuerySnapshot,
    QuerySubscription,
};
#[cfg(test)]
pub use draft_store::{MockDraftStore, MockDraftStores};
pub use draft_store::{DraftStore, DraftStoreError, DraftStores};
#[cfg(test)]
pub use navigator::MockNavigator;
pub use navigator::{Navigation, Navigator, RecordingNavigator};
pub use subscription::{Subscription, Unsubscribe};
