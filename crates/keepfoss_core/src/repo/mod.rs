//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note store contract used by the service layer.
//! - Isolate SQLite query details and live-query fan-out from orchestration.
//!
//! # Invariants
//! - Store writes enforce `Note::validate()` before persistence.
//! - Every committed mutation that changes the note set is redelivered to all
//!   live subscribers.

pub mod live;
pub mod note_store;
