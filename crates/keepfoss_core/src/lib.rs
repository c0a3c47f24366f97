//! Core domain logic for KeepFOSS notes.
//!
//! Owns the note model, the SQLite-backed note store with live queries, the
//! note service and the JSON backup codec. Presentation lives in the host app.

pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use backup::{backup_file_name, export_all, import_all, BackupError, BACKUP_MIME_TYPE};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteValidationError, COLOR_INDEX_COUNT, UNSAVED_NOTE_ID};
pub use repo::live::{LiveQuery, NoteSnapshot, NoteSubscription};
pub use repo::note_store::{NoteStore, RepoError, RepoResult, SqliteNoteStore};
pub use service::color::{ColorPicker, FixedColorPicker, RandomColorPicker};
pub use service::note_service::{ExportSummary, ImportSummary, NoteService, NoteServiceError};
pub use service::worker::{NoteCommand, NoteWorker, Outcome, StartupError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
