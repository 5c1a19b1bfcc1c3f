//! Todo handler service.
//!
//! # Responsibility
//! - Provide `list`, `get`, `create`, `toggle_complete`, `remove` and
//!   `clear_all` over any `TodoRepository`.
//! - Assign identity and creation time for new records.
//!
//! # Invariants
//! - `create` never persists a title that is empty after trimming.
//! - `toggle_complete` on a missing id fails with `Todo not found`.
//! - `remove` on a missing id is a silent success.
//! - `clear_all` never fails on an empty collection.

use crate::model::todo::{validate_title, Todo, TodoId, TodoValidationError};
use crate::repo::todo_repo::{RepoError, TodoRepository};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-facing handler error.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Malformed input, e.g. an empty title.
    Validation(TodoValidationError),
    /// Operation targets a record that does not exist.
    NotFound(TodoId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound(_) => write!(f, "Todo not found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TodoValidationError> for TodoServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, TodoServiceError>;

/// Result envelope of `clear_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAllResult {
    pub deleted: usize,
}

/// Handler facade over a repository implementation.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns all records, newest first. Empty collection yields `[]`.
    pub fn list(&self) -> ServiceResult<Vec<Todo>> {
        Ok(self.repo.list_todos()?)
    }

    pub fn get(&self, id: TodoId) -> ServiceResult<Option<Todo>> {
        Ok(self.repo.get_todo(id)?)
    }

    /// Inserts a new incomplete record and returns its id.
    ///
    /// The title is stored exactly as received.
    pub fn create(&self, title: &str) -> ServiceResult<TodoId> {
        validate_title(title)?;
        let todo = Todo::new(title);
        Ok(self.repo.insert_todo(&todo)?)
    }

    /// Flips `completed` and returns the new value.
    pub fn toggle_complete(&self, id: TodoId) -> ServiceResult<bool> {
        Ok(self.repo.toggle_completed(id)?)
    }

    /// Deletes one record. Returns whether anything was removed.
    pub fn remove(&self, id: TodoId) -> ServiceResult<bool> {
        Ok(self.repo.delete_todo(id)?)
    }

    pub fn clear_all(&self) -> ServiceResult<ClearAllResult> {
        let deleted = self.repo.delete_all()?;
        Ok(ClearAllResult { deleted })
    }
}
