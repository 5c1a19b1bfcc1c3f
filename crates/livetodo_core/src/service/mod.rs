//! Store-side handlers.
//!
//! # Responsibility
//! - Turn repository primitives into the five collection handlers.
//! - Map storage errors to the caller-facing error taxonomy.

pub mod todo_service;
