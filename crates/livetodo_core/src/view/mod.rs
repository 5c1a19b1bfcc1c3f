//! UI-side bindings over the shared store.
//!
//! # Responsibility
//! - Keep a view's rendered items equal to the live `list()` result.
//! - Route user actions to store handlers without local prediction.
//!
//! # Invariants
//! - Items are only exposed once the first `list()` result has arrived.
//! - Empty (after normalization) input never reaches `create`.

pub mod binding;
