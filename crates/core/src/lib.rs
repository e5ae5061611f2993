//! Psyclinic Core - domain entities, services, and traits.
//!
//! This crate holds everything that does not talk to a language model:
//! trainee accounts, login sessions, the patient profile a practice session is
//! started from, and avatar selection. Storage is reached through traits so the
//! bundled CSV and in-memory backends can be swapped.

pub mod constants;
pub mod errors;
pub mod sessions;
pub mod simulation;
pub mod users;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
