//! Create-heist form and assignee loading.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{DraftAutosave, FormError, FormPhase, HeistDraft};
use crate::domain::document::{HEISTS_COLLECTION, USERS_COLLECTION};
use crate::domain::ports::{DocumentStore, DraftStore, Navigator};
use crate::domain::validation::{
    FieldErrors, validate_assignee, validate_description, validate_title,
};
use crate::domain::{ErrorCode, HeistId, NewHeist, Route, User, UserId, UserProfile};

const NOT_SIGNED_IN: &str = "You must be logged in to create a heist";
const CREATE_FAILED: &str = "Failed to create heist. Please try again.";

/// Members a heist can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignees {
    /// At least one other member exists.
    Available(Vec<UserProfile>),
    /// The current user is the only member.
    NoneAvailable,
    /// Profiles could not be read.
    LoadFailed,
}

impl Assignees {
    /// Message shown instead of the form, if any.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Available(_) => None,
            Self::NoneAvailable => Some(
                "No users available to assign this heist to. Please invite team members first.",
            ),
            Self::LoadFailed => Some("Failed to load users. Please refresh the page."),
        }
    }

    /// Profile of `id`, when available.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&UserProfile> {
        match self {
            Self::Available(profiles) => profiles.iter().find(|p| p.id.as_str() == id),
            _ => None,
        }
    }
}

/// Read member profiles, excluding `current`.
///
/// Profiles that fail to decode are skipped.
pub async fn load_assignees(store: &dyn DocumentStore, current: &UserId) -> Assignees {
    let documents = match store.list_documents(USERS_COLLECTION).await {
        Ok(documents) => documents,
        Err(err) => {
            error!(error = %err, "failed to fetch users");
            return Assignees::LoadFailed;
        }
    };
    let profiles: Vec<UserProfile> = documents
        .iter()
        .filter_map(|document| {
            let profile = UserProfile::from_fields(&document.fields);
            if profile.is_none() {
                warn!(document_id = %document.id, "skipping malformed user profile");
            }
            profile
        })
        .filter(|profile| &profile.id != current)
        .collect();
    if profiles.is_empty() {
        Assignees::NoneAvailable
    } else {
        Assignees::Available(profiles)
    }
}

/// Form creating a heist on behalf of the signed-in user.
///
/// Mounting restores the saved draft; every edit schedules a debounced save.
pub struct CreateHeistForm {
    store: Arc<dyn DocumentStore>,
    navigator: Arc<dyn Navigator>,
    autosave: DraftAutosave,
    draft: HeistDraft,
    errors: FieldErrors,
    general: Option<&'static str>,
    phase: FormPhase,
}

impl CreateHeistForm {
    /// Mount the form, restoring any saved draft.
    #[must_use]
    pub fn mount(
        store: Arc<dyn DocumentStore>,
        drafts: Arc<dyn DraftStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_autosave(store, DraftAutosave::new(drafts), navigator)
    }

    /// Mount the form with a preconfigured autosave.
    #[must_use]
    pub fn with_autosave(
        store: Arc<dyn DocumentStore>,
        autosave: DraftAutosave,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let draft = autosave.load().unwrap_or_default();
        Self {
            store,
            navigator,
            autosave,
            draft,
            errors: FieldErrors::default(),
            general: None,
            phase: FormPhase::Editing,
        }
    }

    /// Current input.
    #[must_use]
    pub fn draft(&self) -> &HeistDraft {
        &self.draft
    }

    /// Field messages from the last validation.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Form-level message from the last submission.
    #[must_use]
    pub fn general_error(&self) -> Option<&'static str> {
        self.general
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Apply an edit and schedule a draft save.
    ///
    /// Must be called from within a tokio runtime.
    pub fn edit(&mut self, change: impl FnOnce(&mut HeistDraft)) {
        if self.phase != FormPhase::Editing {
            return;
        }
        change(&mut self.draft);
        self.autosave.schedule(&self.draft);
    }

    /// Replace the whole input.
    pub fn replace(&mut self, draft: HeistDraft) {
        self.edit(|current| *current = draft);
    }

    /// Select an assignee, copying their codename from `assignees`.
    pub fn select_assignee(&mut self, id: &str, assignees: &Assignees) {
        let codename = assignees
            .find(id)
            .map(|profile| profile.codename.to_string())
            .unwrap_or_default();
        let id = id.to_owned();
        self.edit(|draft| {
            draft.assigned_to = id;
            draft.assigned_to_codename = codename;
        });
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check("title", validate_title(&self.draft.title));
        errors.check("description", validate_description(&self.draft.description));
        errors.check("assignedTo", validate_assignee(&self.draft.assigned_to));
        errors
    }

    /// Validate and write the heist as `user`.
    ///
    /// On success the draft is cleared, pending saves are cancelled and the
    /// navigator is sent to `/heists`.
    pub async fn submit(&mut self, user: Option<&User>) -> Result<HeistId, FormError> {
        if self.phase != FormPhase::Editing {
            return Err(FormError::general(ErrorCode::Conflict, "Submission in progress"));
        }
        self.general = None;
        self.errors = self.validate();
        if !self.errors.is_empty() {
            return Err(FormError::Invalid(self.errors.clone()));
        }
        let Some(user) = user else {
            self.general = Some(NOT_SIGNED_IN);
            return Err(FormError::general(ErrorCode::Unauthorized, NOT_SIGNED_IN));
        };
        let assigned_to = match UserId::new(self.draft.assigned_to.clone()) {
            Ok(id) => id,
            Err(_) => {
                self.errors.insert("assignedTo", "Please select a user to assign this heist to");
                return Err(FormError::Invalid(self.errors.clone()));
            }
        };

        self.phase = FormPhase::Submitting;
        let new_heist = NewHeist::by(
            user,
            self.draft.title.clone(),
            self.draft.description.clone(),
            assigned_to,
            self.draft.assigned_to_codename.clone(),
        );
        match self
            .store
            .add_document(HEISTS_COLLECTION, new_heist.into_fields())
            .await
        {
            Ok(id) => {
                info!(heist_id = %id, created_by = %user.id, "heist created");
                self.autosave.clear();
                self.phase = FormPhase::Redirecting;
                self.navigator.push(Route::Heists);
                Ok(HeistId::new(id))
            }
            Err(err) => {
                error!(error = %err, "failed to create heist");
                self.general = Some(CREATE_FAILED);
                self.phase = FormPhase::Editing;
                Err(FormError::general(ErrorCode::ServiceUnavailable, CREATE_FAILED))
            }
        }
    }
}
