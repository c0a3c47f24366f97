//! Backup codec for the `[ { id, title, content, colorIndex }, ... ]` format.
//!
//! Field order is not significant and unknown fields are ignored. Missing
//! `title`/`content` decode as empty strings, missing `colorIndex` and `id`
//! decode as `0`.

use crate::model::note::{validate_color_index, Note};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

/// MIME type offered to document pickers for export and import.
pub const BACKUP_MIME_TYPE: &str = "application/json";
/// File name prefix for exported backups.
pub const BACKUP_FILE_PREFIX: &str = "keepfoss_backup_";
/// File name extension for exported backups.
pub const BACKUP_FILE_EXTENSION: &str = "json";

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug)]
pub enum BackupError {
    /// Document is not JSON or not an array of note objects.
    Json(serde_json::Error),
    /// Reading or writing the backup stream failed.
    Io(std::io::Error),
    /// A record parsed but carries a value the model cannot hold.
    InvalidRecord { index: usize, reason: String },
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed backup document: {err}"),
            Self::Io(err) => write!(f, "backup i/o failed: {err}"),
            Self::InvalidRecord { index, reason } => {
                write!(f, "invalid backup record at index {index}: {reason}")
            }
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidRecord { .. } => None,
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        if value.is_io() {
            Self::Io(value.into())
        } else {
            Self::Json(value)
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Serializes `notes` in the given order, ids included.
pub fn export_all(notes: &[Note]) -> BackupResult<String> {
    Ok(serde_json::to_string_pretty(notes)?)
}

/// Parses a backup document, keeping the source ids.
///
/// # Errors
/// - `BackupError::Json` when the text is not a JSON array of note objects.
/// - `BackupError::InvalidRecord` when a `colorIndex` is outside the palette.
pub fn import_all(json_text: &str) -> BackupResult<Vec<Note>> {
    let notes: Vec<Note> = serde_json::from_str(json_text)?;
    check_records(notes)
}

/// Writes a backup document to `writer`.
pub fn write_backup<W: Write>(mut writer: W, notes: &[Note]) -> BackupResult<()> {
    serde_json::to_writer_pretty(&mut writer, notes)?;
    writer.flush()?;
    Ok(())
}

/// Reads a backup document from `reader`.
pub fn read_backup<R: Read>(reader: R) -> BackupResult<Vec<Note>> {
    let notes: Vec<Note> = serde_json::from_reader(reader)?;
    check_records(notes)
}

/// Suggested export file name: `keepfoss_backup_<unix_millis>.json`.
pub fn backup_file_name(unix_millis: u128) -> String {
    format!("{BACKUP_FILE_PREFIX}{unix_millis}.{BACKUP_FILE_EXTENSION}")
}

fn check_records(notes: Vec<Note>) -> BackupResult<Vec<Note>> {
    for (index, note) in notes.iter().enumerate() {
        validate_color_index(note.color_index).map_err(|err| BackupError::InvalidRecord {
            index,
            reason: err.to_string(),
        })?;
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, export_all, import_all, BackupError};
    use crate::model::note::Note;

    fn note(id: i64, title: &str, content: &str, color_index: u8) -> Note {
        Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            color_index,
        }
    }

    #[test]
    fn export_uses_stable_field_names() {
        let json = export_all(&[note(3, "t", "c", 2)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let record = &value[0];
        assert_eq!(record["id"], 3);
        assert_eq!(record["title"], "t");
        assert_eq!(record["content"], "c");
        assert_eq!(record["colorIndex"], 2);
    }

    #[test]
    fn export_is_deterministic() {
        let notes = vec![note(2, "b", "", 1), note(1, "a", "x", 0)];
        assert_eq!(export_all(&notes).unwrap(), export_all(&notes).unwrap());
    }

    #[test]
    fn import_applies_defaults_and_ignores_unknown_fields() {
        let notes = import_all(r#"[{"id": 9, "pinned": true}, {"title": "only"}]"#).unwrap();
        assert_eq!(notes[0], note(9, "", "", 0));
        assert_eq!(notes[1], note(0, "only", "", 0));
    }

    #[test]
    fn import_treats_null_fields_as_missing() {
        let notes = import_all(
            r#"[{"id": null, "title": null, "content": "kept", "colorIndex": null}]"#,
        )
        .unwrap();
        assert_eq!(notes, vec![note(0, "", "kept", 0)]);
    }

    #[test]
    fn import_keeps_source_ids() {
        let notes = import_all(r#"[{"id": 41, "title": "a", "content": "b", "colorIndex": 4}]"#)
            .unwrap();
        assert_eq!(notes, vec![note(41, "a", "b", 4)]);
    }

    #[test]
    fn import_rejects_non_json_and_wrong_shape() {
        assert!(matches!(import_all("not json"), Err(BackupError::Json(_))));
        assert!(matches!(
            import_all(r#"{"id": 1}"#),
            Err(BackupError::Json(_))
        ));
        assert!(matches!(
            import_all(r#"[{"title": 5}]"#),
            Err(BackupError::Json(_))
        ));
    }

    #[test]
    fn import_rejects_color_outside_palette() {
        let err = import_all(r#"[{"title": "ok"}, {"title": "bad", "colorIndex": 7}]"#)
            .unwrap_err();
        match err {
            BackupError::InvalidRecord { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn backup_file_name_embeds_timestamp() {
        assert_eq!(
            backup_file_name(1_700_000_000_123),
            "keepfoss_backup_1700000000123.json"
        );
    }
}
