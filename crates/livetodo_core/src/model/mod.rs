//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical record stored in the todo collection.
//!
//! # Invariants
//! - Every record is identified by a stable `TodoId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod todo;
