//! Outbound adapters implementing domain ports.
//!
//! - **auth**: in-memory identity provider with salted password digests
//! - **documents**: in-memory document store pushing live snapshots
//! - **drafts**: in-memory and `cap_std` file-backed draft stores
//!
//! Adapters are thin translators between domain types and their storage.
//! They contain no business logic.

pub mod auth;
pub mod documents;
pub mod drafts;

pub use auth::{MemoryAuthClient, MemoryAuthDirectory};
pub use documents::MemoryDocumentStore;
pub use drafts::{FileDraftStore, FileDraftStores, MemoryDraftStore, MemoryDraftStores};
