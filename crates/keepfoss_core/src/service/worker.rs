//! Background worker that runs note use-cases off the host's UI thread.
//!
//! # Responsibility
//! - Serialize commands into a single logical writer thread.
//! - Report every command's completion as an `Outcome` on its own channel.
//!
//! # Invariants
//! - Commands execute in submission order.
//! - No failure panics across the worker boundary; it becomes
//!   `Outcome::Failure` with a user-facing message.
//! - Dropping the worker drains queued commands and joins the thread.

use crate::config::CoreConfig;
use crate::db::{open_db, DbError};
use crate::logging::init_logging;
use crate::model::note::Note;
use crate::repo::live::NoteSubscription;
use crate::repo::note_store::{NoteStore, RepoError, SqliteNoteStore};
use crate::service::color::{ColorPicker, RandomColorPicker};
use crate::service::note_service::{NoteService, NoteServiceError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "keepfoss-notes";

/// One host gesture translated into a note use-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteCommand {
    /// Tap-to-create: blank drafts allowed.
    Add { title: String, content: String },
    /// Save-from-form: requires some text.
    Save { title: String, content: String },
    /// Long-press-to-delete.
    Delete(Note),
    /// Import a backup document given as text.
    Import(String),
    /// Import a backup file chosen by the host.
    ImportFile(PathBuf),
    /// Export the current note set as backup text.
    Export,
    /// Export the current note set into `dir`.
    ExportToDir { dir: PathBuf, unix_millis: u128 },
}

impl NoteCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Save { .. } => "save",
            Self::Delete(_) => "delete",
            Self::Import(_) => "import",
            Self::ImportFile(_) => "import_file",
            Self::Export => "export",
            Self::ExportToDir { .. } => "export_to_dir",
        }
    }
}

/// Completion signal delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Command succeeded; carries a user-facing notification.
    Success(String),
    /// Export succeeded; carries the backup text.
    Exported { json: String, note_count: usize },
    /// Command failed; carries a user-facing notification.
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    /// Human-readable notification text.
    pub fn message(&self) -> String {
        match self {
            Self::Success(message) | Self::Failure(message) => message.clone(),
            Self::Exported { note_count, .. } => format!("Exported {note_count} notes"),
        }
    }
}

/// Failure while bringing up a configured worker.
#[derive(Debug)]
pub enum StartupError {
    Logging(String),
    Db(DbError),
    Repo(RepoError),
    Io(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "database setup failed: {err}"),
            Self::Repo(err) => write!(f, "note store setup failed: {err}"),
            Self::Io(err) => write!(f, "note worker i/o failed: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

struct Job {
    command: NoteCommand,
    reply: Sender<Outcome>,
}

/// Handle to the background note worker.
///
/// Keeps a clone of the store so live queries can be opened from any thread.
pub struct NoteWorker<S: NoteStore> {
    store: S,
    queue: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl NoteWorker<Arc<SqliteNoteStore>> {
    /// Initializes logging, opens the configured database and starts a
    /// worker over it.
    pub fn start_with_config(config: &CoreConfig) -> Result<Self, StartupError> {
        let log_dir = config.log_dir();
        let log_dir = log_dir.to_str().ok_or_else(|| {
            StartupError::Logging(format!(
                "log_dir `{}` is not valid UTF-8",
                log_dir.display()
            ))
        })?;
        init_logging(config.log_level(), log_dir).map_err(StartupError::Logging)?;

        std::fs::create_dir_all(config.data_dir()).map_err(StartupError::Io)?;
        let conn = open_db(config.db_path()).map_err(StartupError::Db)?;
        let store = Arc::new(SqliteNoteStore::try_new(conn).map_err(StartupError::Repo)?);
        Self::start(store, RandomColorPicker).map_err(StartupError::Io)
    }
}

impl<S> NoteWorker<S>
where
    S: NoteStore + Clone + Send + 'static,
{
    /// Spawns the worker thread over `store`.
    pub fn start<P>(store: S, picker: P) -> std::io::Result<Self>
    where
        P: ColorPicker + Send + 'static,
    {
        let (queue, jobs) = mpsc::channel::<Job>();
        let service = NoteService::with_picker(store.clone(), picker);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(service, jobs))?;

        info!("event=worker_start module=service status=ok");
        Ok(Self {
            store,
            queue: Some(queue),
            handle: Some(handle),
        })
    }
}

impl<S: NoteStore> NoteWorker<S> {
    /// Queues `command`; the returned channel yields exactly one outcome.
    ///
    /// A stopped worker answers immediately with a failure.
    pub fn submit(&self, command: NoteCommand) -> Receiver<Outcome> {
        let (reply, outcome) = mpsc::channel();
        let job = Job { command, reply };
        let rejected = match self.queue.as_ref() {
            Some(queue) => queue.send(job).err().map(|mpsc::SendError(job)| job),
            None => Some(job),
        };
        if let Some(job) = rejected {
            error!(
                "event=worker_submit module=service status=error command={} error_code=worker_stopped",
                job.command.name()
            );
            let _ = job
                .reply
                .send(Outcome::Failure("Notes are unavailable right now".to_string()));
        }
        outcome
    }

    pub fn add_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Receiver<Outcome> {
        self.submit(NoteCommand::Add {
            title: title.into(),
            content: content.into(),
        })
    }

    pub fn save_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Receiver<Outcome> {
        self.submit(NoteCommand::Save {
            title: title.into(),
            content: content.into(),
        })
    }

    pub fn delete_note(&self, note: Note) -> Receiver<Outcome> {
        self.submit(NoteCommand::Delete(note))
    }

    pub fn import_notes(&self, json_text: impl Into<String>) -> Receiver<Outcome> {
        self.submit(NoteCommand::Import(json_text.into()))
    }

    pub fn export_notes(&self) -> Receiver<Outcome> {
        self.submit(NoteCommand::Export)
    }

    /// Opens a live query; snapshots arrive as the worker mutates the store.
    pub fn subscribe(&self) -> Result<NoteSubscription, NoteServiceError> {
        Ok(self.store.query_all()?)
    }

    /// Stops accepting commands, finishes queued ones and joins the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.queue.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=worker_stop module=service status=error error_code=worker_panicked");
            } else {
                info!("event=worker_stop module=service status=ok");
            }
        }
    }
}

impl<S: NoteStore> Drop for NoteWorker<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<S: NoteStore, P: ColorPicker>(service: NoteService<S, P>, jobs: Receiver<Job>) {
    for Job { command, reply } in jobs {
        let name = command.name();
        let outcome = execute(&service, command);
        debug!(
            "event=worker_command module=service command={name} status={}",
            if outcome.is_success() { "ok" } else { "error" }
        );
        // Host may have dropped the receiver; the command still ran.
        let _ = reply.send(outcome);
    }
}

fn execute<S: NoteStore, P: ColorPicker>(
    service: &NoteService<S, P>,
    command: NoteCommand,
) -> Outcome {
    let result = match command {
        NoteCommand::Add { title, content } => service
            .add_note(title, content)
            .map(|_| Outcome::Success("Note added".to_string())),
        NoteCommand::Save { title, content } => service
            .save_note(title, content)
            .map(|_| Outcome::Success("Note saved".to_string())),
        NoteCommand::Delete(note) => service
            .delete_note(&note)
            .map(|_| Outcome::Success("Note deleted".to_string())),
        NoteCommand::Import(json_text) => service
            .import_notes(&json_text)
            .map(|summary| Outcome::Success(format!("Imported {} notes", summary.imported))),
        NoteCommand::ImportFile(path) => service
            .import_from_file(&path)
            .map(|summary| Outcome::Success(format!("Imported {} notes", summary.imported))),
        NoteCommand::Export => service
            .export_snapshot()
            .map(|(json, note_count)| Outcome::Exported { json, note_count }),
        NoteCommand::ExportToDir { dir, unix_millis } => service
            .export_to_dir(&dir, unix_millis)
            .map(|summary| {
                Outcome::Success(format!(
                    "Exported {} notes to {}",
                    summary.exported,
                    summary.path.display()
                ))
            }),
    };

    result.unwrap_or_else(|err| {
        warn!("event=worker_command module=service status=error error={err}");
        Outcome::Failure(err.user_message())
    })
}
