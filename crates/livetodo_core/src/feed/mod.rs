//! Change notification for live queries.
//!
//! # Responsibility
//! - Track which query shapes are being watched.
//! - Fan out commit notices to every subscription reading the changed
//!   collection.
//!
//! # Invariants
//! - Publishing never blocks on a slow or absent reader.
//! - Dropped subscriptions stop receiving notices.

pub mod change_feed;
