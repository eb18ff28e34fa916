//! Port abstraction for the local key-value store holding form drafts.
//!
//! Draft stores are synchronous and scoped to one device. A server opens one
//! store per signed-in member through [`DraftStores`].
use std::sync::Arc;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by draft store adapters.
    pub enum DraftStoreError {
        /// Reading or writing the backing storage failed.
        Io { message: String } => "draft store i/o failed: {message}",
        /// The key is not usable by this store.
        InvalidKey { key: String } => "invalid draft key: {key}",
    }
}

/// Synchronous string key-value store.
#[cfg_attr(test, mockall::automock)]
pub trait DraftStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError>;

    /// Remove `key`; removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), DraftStoreError>;
}

/// Opens the draft store belonging to a member.
#[cfg_attr(test, mockall::automock)]
pub trait DraftStores: Send + Sync {
    /// Draft store for `owner`.
    fn open(&self, owner: &UserId) -> Result<Arc<dyn DraftStore>, DraftStoreError>;
}
