//! Shared todo store.
//!
//! # Responsibility
//! - Own the single connection and change feed for the todo collection.
//! - Serialize every handler call and notify subscribers after commits.
//! - Provide the explicitly initialized process-wide instance.
//!
//! # Invariants
//! - All mutations pass through `TodoStore`; nothing else writes `todos`.
//! - Notices are published only after a handler committed a change.

mod global;
mod todo_store;

pub use global::{global_store, init_global_store};
pub use todo_store::{StoreError, StoreResult, TodoStore};
