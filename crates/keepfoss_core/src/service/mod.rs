//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and codec calls into note use-cases.
//! - Run those use-cases off the host's interactive thread.
//!
//! # Invariants
//! - Service APIs never bypass store validation/persistence contracts.
//! - Failures reaching the host are plain success/failure outcomes.

pub mod color;
pub mod note_service;
pub mod worker;
