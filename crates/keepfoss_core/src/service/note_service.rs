//! Note use-case service.
//!
//! # Responsibility
//! - Provide add/save/delete/list APIs over a `NoteStore`.
//! - Assign the random accent color on creation.
//! - Import and export whole collections through the backup codec.
//!
//! # Invariants
//! - Imported notes are always new creations; source ids are discarded.
//! - A document that fails to decode imports zero notes.
//! - Export always reflects the store's current note set.

use crate::backup::codec::{self, BackupError};
use crate::model::note::{Note, NoteValidationError};
use crate::repo::live::NoteSubscription;
use crate::repo::note_store::{NoteStore, RepoError};
use crate::service::color::{ColorPicker, RandomColorPicker};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Save requested with blank title and content.
    EmptyNote,
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Backup document could not be read, decoded or written.
    Backup(BackupError),
    /// Storage failed part-way through an import.
    ImportInterrupted { imported: usize, source: RepoError },
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyNote => write!(f, "note title and content are both blank"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "{err}"),
            Self::ImportInterrupted { imported, source } => {
                write!(f, "import stopped after {imported} notes: {source}")
            }
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Backup(err) => Some(err),
            Self::ImportInterrupted { source, .. } => Some(source),
            Self::EmptyNote | Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<BackupError> for NoteServiceError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<std::io::Error> for NoteServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Backup(BackupError::Io(value))
    }
}

impl NoteServiceError {
    /// Short, generic message suitable for a user notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyNote => "Add a title or some text before saving".to_string(),
            Self::Repo(_) | Self::InconsistentState(_) => "Could not update your notes".to_string(),
            Self::Backup(BackupError::Io(_)) => "Could not access the backup file".to_string(),
            Self::Backup(_) => "Import failed: not a valid backup file".to_string(),
            Self::ImportInterrupted { imported, .. } => {
                format!("Import stopped after {imported} notes")
            }
        }
    }
}

/// Result of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of notes inserted as new records.
    pub imported: usize,
}

/// Result of a completed file export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Written backup file.
    pub path: PathBuf,
    /// Number of notes in the backup.
    pub exported: usize,
}

/// Note service facade over a store implementation.
pub struct NoteService<S: NoteStore, P: ColorPicker = RandomColorPicker> {
    store: S,
    picker: P,
}

impl<S: NoteStore> NoteService<S> {
    /// Creates a service that picks accent colors uniformly at random.
    pub fn new(store: S) -> Self {
        Self::with_picker(store, RandomColorPicker)
    }
}

impl<S: NoteStore, P: ColorPicker> NoteService<S, P> {
    /// Creates a service with a caller-provided color picker.
    pub fn with_picker(store: S, picker: P) -> Self {
        Self { store, picker }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates one note with a freshly picked accent color.
    ///
    /// Blank title and content are accepted here; see [`Self::save_note`].
    pub fn add_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        self.persist(Note::draft(title, content, self.picker.pick()))
    }

    /// Save-from-form entry point: rejects drafts without any text.
    pub fn save_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let draft = Note::draft(title, content, self.picker.pick());
        draft.validate_for_save().map_err(|err| match err {
            NoteValidationError::EmptyDraft => NoteServiceError::EmptyNote,
            other => NoteServiceError::Repo(RepoError::Validation(other)),
        })?;
        self.persist(draft)
    }

    /// Deletes `note`; deleting an already missing note succeeds.
    ///
    /// Returns whether a record was actually removed.
    pub fn delete_note(&self, note: &Note) -> Result<bool, NoteServiceError> {
        Ok(self.store.delete(note)?)
    }

    /// Returns all notes, most recent first.
    pub fn list_notes(&self) -> Result<Vec<Note>, NoteServiceError> {
        Ok(self.store.list_all()?)
    }

    /// Opens a live query over all notes.
    pub fn subscribe(&self) -> Result<NoteSubscription, NoteServiceError> {
        Ok(self.store.query_all()?)
    }

    /// Imports a backup document as new notes.
    ///
    /// The whole document is decoded before the first insert, so malformed
    /// input leaves the store untouched.
    pub fn import_notes(&self, json_text: &str) -> Result<ImportSummary, NoteServiceError> {
        let notes = codec::import_all(json_text).map_err(|err| {
            warn!("event=notes_import module=service status=rejected error={err}");
            NoteServiceError::from(err)
        })?;
        self.insert_imported(&notes)
    }

    /// Imports a backup file as new notes.
    pub fn import_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, NoteServiceError> {
        let decoded = File::open(path.as_ref())
            .map_err(BackupError::from)
            .and_then(|file| codec::read_backup(BufReader::new(file)));
        let notes = decoded.map_err(|err| {
            warn!("event=notes_import module=service status=rejected source=file error={err}");
            NoteServiceError::from(err)
        })?;
        self.insert_imported(&notes)
    }

    /// Serializes the store's current note set.
    pub fn export_notes(&self) -> Result<String, NoteServiceError> {
        self.export_snapshot().map(|(json, _)| json)
    }

    /// Serializes the store's current note set and reports how many notes it
    /// contains.
    pub fn export_snapshot(&self) -> Result<(String, usize), NoteServiceError> {
        let notes = self.store.list_all()?;
        let json = codec::export_all(&notes)?;
        info!(
            "event=notes_export module=service status=ok note_count={}",
            notes.len()
        );
        Ok((json, notes.len()))
    }

    /// Writes the current note set to `dir/keepfoss_backup_<unix_millis>.json`.
    pub fn export_to_dir(
        &self,
        dir: impl AsRef<Path>,
        unix_millis: u128,
    ) -> Result<ExportSummary, NoteServiceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(codec::backup_file_name(unix_millis));

        let notes = self.store.list_all()?;
        let file = File::create(&path)?;
        codec::write_backup(BufWriter::new(file), &notes)?;

        info!(
            "event=notes_export module=service status=ok target=file note_count={}",
            notes.len()
        );
        Ok(ExportSummary {
            path,
            exported: notes.len(),
        })
    }

    fn persist(&self, draft: Note) -> Result<Note, NoteServiceError> {
        let id = self.store.insert(&draft)?;
        self.store
            .get(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    fn insert_imported(&self, notes: &[Note]) -> Result<ImportSummary, NoteServiceError> {
        let mut imported = 0;
        for note in notes {
            if let Err(source) = self.store.insert(&note.without_id()) {
                warn!(
                    "event=notes_import module=service status=interrupted imported={imported} total={} error={source}",
                    notes.len()
                );
                return Err(NoteServiceError::ImportInterrupted { imported, source });
            }
            imported += 1;
        }

        info!("event=notes_import module=service status=ok imported={imported}");
        Ok(ImportSummary { imported })
    }
}

#[cfg(test)]
mod tests {
    use super::NoteServiceError;
    use crate::backup::codec::BackupError;

    #[test]
    fn user_messages_stay_generic() {
        let parse = serde_json::from_str::<Vec<u8>>("nope").unwrap_err();
        let err = NoteServiceError::Backup(BackupError::Json(parse));
        assert_eq!(err.user_message(), "Import failed: not a valid backup file");
        assert!(!NoteServiceError::EmptyNote.user_message().is_empty());
    }
}
