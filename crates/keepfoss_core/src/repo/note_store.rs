//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist, delete and list notes on top of the `notes` table.
//! - Serve live queries that redeliver the full ordered set after each write.
//!
//! # Invariants
//! - Ids are assigned by SQLite `AUTOINCREMENT`: unique, increasing, never
//!   reused, and never taken from the caller.
//! - Listing order is most recent first (`id DESC`).
//! - Deleting an unknown id is a successful no-op.
//! - Snapshots are published while the writer lock is held, so subscribers
//!   observe them in mutation order.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteValidationError, UNSAVED_NOTE_ID};
use crate::repo::live::{LiveQuery, NoteSubscription};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const NOTE_SELECT_SQL: &str = "SELECT id, title, content, color_index FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "database is not migrated: missing table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "database is not migrated: missing column `{table}.{column}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for notes.
pub trait NoteStore {
    /// Persists a new note and returns its freshly assigned id.
    ///
    /// The `id` of `note` is ignored.
    fn insert(&self, note: &Note) -> RepoResult<NoteId>;
    /// Removes the note with `note.id`.
    ///
    /// Returns `false` when nothing matched; that is not an error.
    fn delete(&self, note: &Note) -> RepoResult<bool>;
    /// Gets one note by id.
    fn get(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Returns a one-shot snapshot ordered most recent first.
    fn list_all(&self) -> RepoResult<Vec<Note>>;
    /// Opens a live query over all notes, seeded with the current set.
    fn query_all(&self) -> RepoResult<NoteSubscription>;
}

impl<S: NoteStore + ?Sized> NoteStore for Arc<S> {
    fn insert(&self, note: &Note) -> RepoResult<NoteId> {
        (**self).insert(note)
    }

    fn delete(&self, note: &Note) -> RepoResult<bool> {
        (**self).delete(note)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        (**self).list_all()
    }

    fn query_all(&self) -> RepoResult<NoteSubscription> {
        (**self).query_all()
    }
}

/// SQLite-backed note store with live-query fan-out.
///
/// Owns its connection; share it across threads through `Arc`.
#[derive(Debug)]
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
    live: LiveQuery,
}

impl SqliteNoteStore {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the connection
    ///   was not opened through `db::open_db*`.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            live: LiveQuery::new(),
        })
    }

    /// Returns the number of registered live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.live.subscriber_count()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Runs after a committed write: failures are logged, never returned.
    fn publish_current(&self, conn: &Connection) {
        match list_notes(conn) {
            Ok(snapshot) => {
                debug!(
                    "event=live_publish module=repo status=ok note_count={} subscribers={}",
                    snapshot.len(),
                    self.live.subscriber_count()
                );
                self.live.publish(snapshot);
            }
            Err(err) => {
                error!("event=live_publish module=repo status=error error={err}");
            }
        }
    }
}

impl NoteStore for SqliteNoteStore {
    fn insert(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        let conn = self.lock();
        let result = conn.execute(
            "INSERT INTO notes (title, content, color_index) VALUES (?1, ?2, ?3);",
            params![note.title, note.content, i64::from(note.color_index)],
        );
        if let Err(err) = result {
            error!("event=note_insert module=repo status=error error={err}");
            return Err(err.into());
        }

        let id = conn.last_insert_rowid();
        info!(
            "event=note_insert module=repo status=ok note_id={id} color_index={}",
            note.color_index
        );
        self.publish_current(&conn);
        Ok(id)
    }

    fn delete(&self, note: &Note) -> RepoResult<bool> {
        if note.id == UNSAVED_NOTE_ID {
            debug!("event=note_delete module=repo status=skipped reason=unsaved");
            return Ok(false);
        }

        let conn = self.lock();
        let changed = match conn.execute("DELETE FROM notes WHERE id = ?1;", [note.id]) {
            Ok(changed) => changed,
            Err(err) => {
                error!(
                    "event=note_delete module=repo status=error note_id={} error={err}",
                    note.id
                );
                return Err(err.into());
            }
        };

        if changed == 0 {
            debug!(
                "event=note_delete module=repo status=noop note_id={}",
                note.id
            );
            return Ok(false);
        }

        info!("event=note_delete module=repo status=ok note_id={}", note.id);
        self.publish_current(&conn);
        Ok(true)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], read_raw_note).optional()?;
        raw.map(RawNote::into_note).transpose()
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        let conn = self.lock();
        list_notes(&conn)
    }

    fn query_all(&self) -> RepoResult<NoteSubscription> {
        let conn = self.lock();
        let current = list_notes(&conn)?;
        Ok(self.live.subscribe(current))
    }
}

struct RawNote {
    id: NoteId,
    title: String,
    content: String,
    color_index: i64,
}

impl RawNote {
    fn into_note(self) -> RepoResult<Note> {
        let color_index = u8::try_from(self.color_index).map_err(|_| {
            RepoError::InvalidData(format!(
                "color_index {} of note {} does not fit the palette",
                self.color_index, self.id
            ))
        })?;
        let note = Note {
            id: self.id,
            title: self.title,
            content: self.content,
            color_index,
        };
        note.validate()
            .map_err(|err| RepoError::InvalidData(format!("note {}: {err}", note.id)))?;
        Ok(note)
    }
}

fn read_raw_note(row: &Row<'_>) -> rusqlite::Result<RawNote> {
    Ok(RawNote {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        color_index: row.get("color_index")?,
    })
}

fn list_notes(conn: &Connection) -> RepoResult<Vec<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id DESC;"))?;
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(read_raw_note(row)?.into_note()?);
    }
    Ok(notes)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in ["id", "title", "content", "color_index"] {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{NoteStore, RepoError, SqliteNoteStore};
    use crate::db::open_db_in_memory;
    use crate::model::note::Note;
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteNoteStore::try_new(conn).unwrap_err();
        assert!(matches!(err, RepoError::MissingRequiredTable("notes")));
    }

    #[test]
    fn insert_ignores_caller_supplied_id() {
        let store = SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap();
        let mut note = Note::draft("t", "c", 1);
        note.id = 999;

        let id = store.insert(&note).unwrap();
        assert_ne!(id, 999);
        assert!(store.get(999).unwrap().is_none());
        assert_eq!(store.get(id).unwrap().unwrap().title, "t");
    }

    #[test]
    fn delete_of_unsaved_note_is_noop() {
        let store = SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap();
        store.insert(&Note::draft("kept", "", 0)).unwrap();

        assert!(!store.delete(&Note::draft("kept", "", 0)).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
