//! Draft store adapters: in-memory and file-backed.
//!
//! File-backed stores keep one directory per member under a root opened
//! through `cap_std`, with one `<key>.json` file per key.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::UserId;
use crate::domain::ports::{DraftStore, DraftStoreError, DraftStores};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Draft store held in memory.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        lock(&self.values).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftStoreError> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// One [`MemoryDraftStore`] per member, kept for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryDraftStores {
    stores: Mutex<HashMap<UserId, Arc<MemoryDraftStore>>>,
}

impl MemoryDraftStores {
    /// No stores yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStores for MemoryDraftStores {
    fn open(&self, owner: &UserId) -> Result<Arc<dyn DraftStore>, DraftStoreError> {
        let store: Arc<dyn DraftStore> = lock(&self.stores)
            .entry(owner.clone())
            .or_default()
            .clone();
        Ok(store)
    }
}

fn io_error(context: &str, err: io::Error) -> DraftStoreError {
    DraftStoreError::io(format!("{context}: {err}"))
}

fn file_name(key: &str) -> Result<String, DraftStoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(format!("{key}.json"))
    } else {
        Err(DraftStoreError::invalid_key(key))
    }
}

/// Draft store writing one file per key inside a directory.
pub struct FileDraftStore {
    dir: Dir,
}

impl FileDraftStore {
    /// Store backed by an already opened directory.
    #[must_use]
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    /// Open (creating if needed) the directory at `path`.
    pub fn open_path(path: &Path) -> Result<Self, DraftStoreError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(|err| io_error("failed to create draft directory", err))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| io_error("failed to open draft directory", err))?;
        Ok(Self::new(dir))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        let name = file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error("failed to read draft", err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        let name = file_name(key)?;
        let staging = format!(".{name}.tmp");
        self.dir
            .write(&staging, value.as_bytes())
            .map_err(|err| io_error("failed to write draft", err))?;
        self.dir
            .rename(&staging, &self.dir, &name)
            .map_err(|err| io_error("failed to commit draft", err))?;
        debug!(key, "draft written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftStoreError> {
        let name = file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error("failed to remove draft", err)),
        }
    }
}

/// One directory per member beneath a root directory.
pub struct FileDraftStores {
    root: Dir,
}

impl FileDraftStores {
    /// Open (creating if needed) the root directory at `path`.
    pub fn open_path(path: &Path) -> Result<Self, DraftStoreError> {
        let FileDraftStore { dir } = FileDraftStore::open_path(path)?;
        Ok(Self { root: dir })
    }
}

impl DraftStores for FileDraftStores {
    fn open(&self, owner: &UserId) -> Result<Arc<dyn DraftStore>, DraftStoreError> {
        // Hex keeps arbitrary ids inside a single path component.
        let name = hex::encode(owner.as_str().as_bytes());
        self.root
            .create_dir_all(&name)
            .map_err(|err| io_error("failed to create member draft directory", err))?;
        let dir = self
            .root
            .open_dir(&name)
            .map_err(|err| io_error("failed to open member draft directory", err))?;
        Ok(Arc::new(FileDraftStore::new(dir)))
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for the draft store adapters.
    use super::*;
    use crate::domain::DRAFT_KEY;
    use rstest::rstest;
    use tempfile::TempDir;

    fn exercise(store: &dyn DraftStore) {
        assert_eq!(store.get(DRAFT_KEY).expect("read"), None);
        store.set(DRAFT_KEY, r#"{"title":"Vault"}"#).expect("write");
        store.set(DRAFT_KEY, r#"{"title":"Vaults"}"#).expect("overwrite");
        assert_eq!(
            store.get(DRAFT_KEY).expect("read").as_deref(),
            Some(r#"{"title":"Vaults"}"#)
        );
        store.remove(DRAFT_KEY).expect("remove");
        store.remove(DRAFT_KEY).expect("removing twice succeeds");
        assert_eq!(store.get(DRAFT_KEY).expect("read"), None);
    }

    #[rstest]
    fn memory_store_behaves_like_a_key_value_store() {
        exercise(&MemoryDraftStore::new());
    }

    #[rstest]
    fn file_store_behaves_like_a_key_value_store() {
        let temp = TempDir::new().expect("temp dir");
        let store = FileDraftStore::open_path(temp.path()).expect("opened");
        exercise(&store);
    }

    #[rstest]
    #[case("../escape")]
    #[case("")]
    #[case("a/b")]
    fn file_store_rejects_path_like_keys(#[case] key: &str) {
        let temp = TempDir::new().expect("temp dir");
        let store = FileDraftStore::open_path(temp.path()).expect("opened");
        assert_eq!(
            store.set(key, "{}"),
            Err(DraftStoreError::invalid_key(key))
        );
    }

    #[rstest]
    fn file_stores_are_isolated_per_member() {
        let temp = TempDir::new().expect("temp dir");
        let stores = FileDraftStores::open_path(&temp.path().join("drafts")).expect("opened");
        let ada = UserId::new("ada").expect("id");
        let bob = UserId::new("bob").expect("id");

        stores
            .open(&ada)
            .expect("ada store")
            .set(DRAFT_KEY, "ada")
            .expect("write");
        assert_eq!(stores.open(&bob).expect("bob store").get(DRAFT_KEY).expect("read"), None);

        let reopened = FileDraftStores::open_path(&temp.path().join("drafts")).expect("reopened");
        assert_eq!(
            reopened.open(&ada).expect("ada store").get(DRAFT_KEY).expect("read").as_deref(),
            Some("ada")
        );
    }

    #[rstest]
    fn memory_stores_return_the_same_store_per_member() {
        let stores = MemoryDraftStores::new();
        let ada = UserId::new("ada").expect("id");
        stores.open(&ada).expect("open").set(DRAFT_KEY, "x").expect("write");
        assert_eq!(
            stores.open(&ada).expect("open").get(DRAFT_KEY).expect("read").as_deref(),
            Some("x")
        );
    }
}
