//! Shared router state.

use crate::services::{expander::ArchiveExpander, storage_service::StorageService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Local object store backing the object routes and the expander.
    pub storage: StorageService,

    pub expander: Arc<ArchiveExpander>,

    /// Emit an object-created notification to the expander after each
    /// successful upload of a `.zip` key.
    pub notify_on_upload: bool,
}

impl AppState {
    pub fn new(storage: StorageService, expander: ArchiveExpander, notify_on_upload: bool) -> Self {
        Self {
            storage,
            expander: Arc::new(expander),
            notify_on_upload,
        }
    }
}
