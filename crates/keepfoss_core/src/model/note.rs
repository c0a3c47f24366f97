//! Note domain model.
//!
//! # Responsibility
//! - Define the record persisted by the note store and carried by backups.
//! - Provide validation used by store writes and the save path.
//!
//! # Invariants
//! - `id == UNSAVED_NOTE_ID` means "not yet persisted".
//! - Serialized field names (`id`, `title`, `content`, `colorIndex`) are the
//!   backup file contract and must not change.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
pub type NoteId = i64;

/// Identifier carried by notes that were never persisted.
pub const UNSAVED_NOTE_ID: NoteId = 0;

/// Number of accent colors a note can pick from (`0..=4`).
pub const COLOR_INDEX_COUNT: u8 = 5;

/// Short text note with a cosmetic accent color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned id; `0` until persisted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: NoteId,
    /// Optional title, blank allowed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Optional body text, blank allowed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Accent color slot in `0..COLOR_INDEX_COUNT`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_index: u8,
}

/// Validation failures for note records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Accent index is outside the supported palette.
    ColorIndexOutOfRange(u8),
    /// Both title and content are blank.
    EmptyDraft,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColorIndexOutOfRange(value) => write!(
                f,
                "color index {value} is out of range 0..={}",
                COLOR_INDEX_COUNT - 1
            ),
            Self::EmptyDraft => write!(f, "note title and content are both blank"),
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Creates an unsaved note draft.
    ///
    /// The store assigns the real id on insert.
    pub fn draft(title: impl Into<String>, content: impl Into<String>, color_index: u8) -> Self {
        Self {
            id: UNSAVED_NOTE_ID,
            title: title.into(),
            content: content.into(),
            color_index,
        }
    }

    /// Returns a copy of this note with its identity cleared.
    ///
    /// Used by import, where externally supplied ids are never trusted.
    pub fn without_id(&self) -> Self {
        Self {
            id: UNSAVED_NOTE_ID,
            ..self.clone()
        }
    }

    /// Returns whether this note has a store-assigned id.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_NOTE_ID
    }

    /// Returns whether title or content carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.content.trim().is_empty()
    }

    /// Validates fields that storage must never accept.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_color_index(self.color_index)
    }

    /// Validates a user-initiated save; stricter than [`Note::validate`].
    pub fn validate_for_save(&self) -> Result<(), NoteValidationError> {
        if !self.has_text() {
            return Err(NoteValidationError::EmptyDraft);
        }
        self.validate()
    }
}

/// Decodes an explicit JSON `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Checks that `value` names one of the supported accent colors.
pub fn validate_color_index(value: u8) -> Result<(), NoteValidationError> {
    if value < COLOR_INDEX_COUNT {
        Ok(())
    } else {
        Err(NoteValidationError::ColorIndexOutOfRange(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteValidationError, UNSAVED_NOTE_ID};

    #[test]
    fn draft_is_not_persisted() {
        let note = Note::draft("title", "body", 2);
        assert_eq!(note.id, UNSAVED_NOTE_ID);
        assert!(!note.is_persisted());
    }

    #[test]
    fn without_id_keeps_payload_fields() {
        let mut note = Note::draft("a", "b", 4);
        note.id = 17;
        let cleared = note.without_id();
        assert_eq!(cleared.id, UNSAVED_NOTE_ID);
        assert_eq!(cleared.title, "a");
        assert_eq!(cleared.content, "b");
        assert_eq!(cleared.color_index, 4);
    }

    #[test]
    fn validate_rejects_color_outside_palette() {
        let note = Note::draft("a", "b", 5);
        assert_eq!(
            note.validate(),
            Err(NoteValidationError::ColorIndexOutOfRange(5))
        );
    }

    #[test]
    fn save_validation_requires_some_text() {
        assert_eq!(
            Note::draft("  ", "\n", 0).validate_for_save(),
            Err(NoteValidationError::EmptyDraft)
        );
        assert!(Note::draft("", "only body", 0).validate_for_save().is_ok());
        assert!(Note::draft("only title", "", 0).validate_for_save().is_ok());
    }
}
