//! Journal session services.
//!
//! # Responsibility
//! - Turn synchronous form edits into debounced, asynchronous saves.
//! - Load and install the entry of a newly selected date.
//!
//! # See also
//! - `gateway` for the persistence seam these services call.

pub mod autosave;
pub mod debounce;
pub mod journal;
pub mod loader;
pub mod notify;
pub mod store;
