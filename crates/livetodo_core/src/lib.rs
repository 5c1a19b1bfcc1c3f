//! Core of LiveTodo: a reactive to-do collection.
//!
//! The store owns persistence and change notification; views subscribe to
//! the live list and converge after any client's write.

pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use config::{CoreConfig, StorageLocation};
pub use feed::change_feed::{
    ChangeFeed, ChangeKind, ChangeNotice, FeedError, QueryKey, Subscription,
};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::todo::{Todo, TodoId, TodoValidationError};
pub use repo::todo_repo::{RepoError, RepoResult, SqliteTodoRepository, TodoRepository};
pub use service::todo_service::{ClearAllResult, TodoService, TodoServiceError};
pub use store::{global_store, init_global_store, StoreError, StoreResult, TodoStore};
pub use view::binding::{TodoView, ViewState};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
