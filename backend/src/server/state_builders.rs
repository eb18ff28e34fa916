//! Builders wiring the outbound adapters into the HTTP state ports.

use std::path::Path;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::DraftStores;
use crate::inbound::http::state::HttpStatePorts;
use crate::outbound::{FileDraftStores, MemoryAuthDirectory, MemoryDocumentStore, MemoryDraftStores};

/// Draft stores backed by `draft_dir` when configured, otherwise memory.
///
/// # Errors
/// Returns [`std::io::Error`] when the draft directory cannot be created or
/// opened.
pub fn build_draft_stores(draft_dir: Option<&Path>) -> std::io::Result<Arc<dyn DraftStores>> {
    match draft_dir {
        Some(path) => {
            let stores = FileDraftStores::open_path(path).map_err(|e| {
                std::io::Error::other(format!(
                    "failed to open draft directory {}: {e}",
                    path.display()
                ))
            })?;
            info!(path = %path.display(), "drafts persisted to disk");
            Ok(Arc::new(stores))
        }
        None => {
            info!("drafts held in memory");
            Ok(Arc::new(MemoryDraftStores::new()))
        }
    }
}

/// Assemble the in-memory identity and document adapters around `clock`.
///
/// # Errors
/// Propagates draft directory failures from [`build_draft_stores`].
pub fn build_ports(
    clock: Arc<dyn Clock>,
    draft_dir: Option<&Path>,
) -> std::io::Result<HttpStatePorts> {
    let drafts = build_draft_stores(draft_dir)?;
    Ok(HttpStatePorts {
        auth: Arc::new(MemoryAuthDirectory::new()),
        documents: Arc::new(MemoryDocumentStore::new(clock.clone())),
        drafts,
        clock,
    })
}
