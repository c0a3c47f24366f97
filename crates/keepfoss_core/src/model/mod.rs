//! Domain model for locally stored notes.
//!
//! # Responsibility
//! - Define the canonical `Note` record shared by store, service and backup.
//! - Own the accent color range and draft validation helpers.
//!
//! # Invariants
//! - A persisted note always carries a non-zero `NoteId`.
//! - `color_index` stays inside `0..COLOR_INDEX_COUNT`.

pub mod note;
