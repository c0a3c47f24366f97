//! JSON backup of the full note collection.
//!
//! # Responsibility
//! - Encode note snapshots into the backup file format.
//! - Decode external backup documents back into `Note` values.
//!
//! # Invariants
//! - Decoding keeps source ids; id-stripping belongs to the service layer.
//! - A document either decodes completely or yields an error.

pub mod codec;

pub use codec::{
    backup_file_name, export_all, import_all, read_backup, write_backup, BackupError,
    BackupResult, BACKUP_FILE_EXTENSION, BACKUP_FILE_PREFIX, BACKUP_MIME_TYPE,
};
