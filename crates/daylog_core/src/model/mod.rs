//! Journal domain model.
//!
//! # Responsibility
//! - Define the per-date entry edited by the journal form.
//! - Define the closed set of field mutations and their reducer.
//! - Hold the activity prompt bank and prompt selection rules.
//!
//! # Invariants
//! - Model types never carry persisted row ids.
//! - Mutations are infallible; well-formed values are the caller's burden.

pub mod entry;
pub mod mutation;
pub mod prompts;
