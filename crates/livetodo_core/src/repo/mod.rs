//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for the todo collection.
//! - Isolate SQLite query details from handler orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Todo::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod todo_repo;
