//! Debounced persistence of the create-heist draft.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::ports::{DraftStore, DraftStoreError};

/// Key the draft is stored under.
pub const DRAFT_KEY: &str = "heist-draft";

/// Quiet period after the last edit before the draft is saved.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(1);

/// In-progress create-heist input, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HeistDraft {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Selected assignee id, empty when none.
    pub assigned_to: String,
    /// Codename of the selected assignee.
    pub assigned_to_codename: String,
}

/// Saves drafts after edits settle.
///
/// Each [`DraftAutosave::schedule`] call replaces the pending save, so only
/// the last edit in a burst is written.
pub struct DraftAutosave {
    store: Arc<dyn DraftStore>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DraftAutosave {
    /// Autosave into `store` with the default delay.
    #[must_use]
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        Self::with_delay(store, AUTOSAVE_DELAY)
    }

    /// Autosave into `store` after `delay`.
    #[must_use]
    pub fn with_delay(store: Arc<dyn DraftStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Read the stored draft.
    ///
    /// A missing, unreadable or malformed draft yields `None`; failures are
    /// logged.
    #[must_use]
    pub fn load(&self) -> Option<HeistDraft> {
        let raw = match self.store.get(DRAFT_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "failed to read heist draft");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(err) => {
                warn!(error = %err, "failed to load draft");
                None
            }
        }
    }

    /// Write `draft` immediately.
    pub fn save_now(&self, draft: &HeistDraft) -> Result<(), DraftStoreError> {
        let json = serde_json::to_string(draft)
            .map_err(|err| DraftStoreError::io(format!("draft encoding failed: {err}")))?;
        self.store.set(DRAFT_KEY, &json)
    }

    /// Replace any pending save with one for `draft`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, draft: &HeistDraft) {
        let store = Arc::clone(&self.store);
        let delay = self.delay;
        let json = match serde_json::to_string(draft) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to encode heist draft");
                return;
            }
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store.set(DRAFT_KEY, &json) {
                Ok(()) => debug!("heist draft saved"),
                Err(err) => warn!(error = %err, "failed to save heist draft"),
            }
        });
        if let Some(previous) = self.lock_pending().replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending save, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.lock_pending().take() {
            pending.abort();
        }
    }

    /// Cancel pending saves and delete the stored draft.
    pub fn clear(&self) {
        self.cancel();
        if let Err(err) = self.store.remove(DRAFT_KEY) {
            warn!(error = %err, "failed to clear heist draft");
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for DraftAutosave {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    //! Debounce and restore behaviour.
    use super::*;
    use crate::domain::ports::MockDraftStore;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, String>>);

    impl MapStore {
        fn value(&self) -> Option<String> {
            self.0.lock().expect("store lock").get(DRAFT_KEY).cloned()
        }
    }

    impl DraftStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
            Ok(self.0.lock().expect("store lock").get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
            self.0
                .lock()
                .expect("store lock")
                .insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), DraftStoreError> {
            self.0.lock().expect("store lock").remove(key);
            Ok(())
        }
    }

    #[fixture]
    fn store() -> Arc<MapStore> {
        Arc::new(MapStore::default())
    }

    fn draft(title: &str) -> HeistDraft {
        HeistDraft {
            title: title.to_owned(),
            ..HeistDraft::default()
        }
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn only_the_last_edit_in_a_burst_is_saved(store: Arc<MapStore>) {
        let autosave = DraftAutosave::new(store.clone());
        autosave.schedule(&draft("V"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        autosave.schedule(&draft("Va"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        autosave.schedule(&draft("Vault"));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(store.value(), None);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let saved: HeistDraft =
            serde_json::from_str(&store.value().expect("draft saved")).expect("valid json");
        assert_eq!(saved.title, "Vault");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn clear_cancels_pending_saves(store: Arc<MapStore>) {
        let autosave = DraftAutosave::new(store.clone());
        autosave.save_now(&draft("Old")).expect("saved");
        autosave.schedule(&draft("New"));
        autosave.clear();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.value(), None);
    }

    #[rstest]
    fn load_restores_camel_case_json(store: Arc<MapStore>) {
        store
            .set(
                DRAFT_KEY,
                r#"{"title":"Vault","description":"Crack it open","assignedTo":"u2","assignedToCodename":"Owl"}"#,
            )
            .expect("seeded");
        let autosave = DraftAutosave::new(store);
        let restored = autosave.load().expect("draft restored");
        assert_eq!(restored.assigned_to, "u2");
        assert_eq!(restored.assigned_to_codename, "Owl");
    }

    #[rstest]
    fn malformed_draft_is_ignored(store: Arc<MapStore>) {
        store.set(DRAFT_KEY, "{not json").expect("seeded");
        assert_eq!(DraftAutosave::new(store).load(), None);
    }

    #[rstest]
    fn read_failures_are_ignored() {
        let mut store = MockDraftStore::new();
        store
            .expect_get()
            .returning(|_| Err(DraftStoreError::io("disk gone")));
        assert_eq!(DraftAutosave::new(Arc::new(store)).load(), None);
    }
}
