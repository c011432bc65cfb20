//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for journal rows.
//! - Isolate SQLite query details from gateway and session orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`InvalidData`) in addition to
//!   DB transport errors.

pub mod journal_repo;
