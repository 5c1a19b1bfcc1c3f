//! Todo record model.
//!
//! # Responsibility
//! - Define the record shared by the store handlers and view binding.
//! - Own the single store-level title rule.
//!
//! # Invariants
//! - `id` and `creation_timestamp` are assigned once at creation.
//! - `title` is never mutated after creation.
//! - `completed` starts as `false` and only flips through a toggle.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier assigned by the store at creation.
pub type TodoId = Uuid;

/// One to-do document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    /// Display text; non-empty after trimming.
    pub title: String,
    pub completed: bool,
    /// Unix epoch milliseconds. Sole ordering key for list views.
    pub creation_timestamp: i64,
}

/// Validation failures for todo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// Title is empty or whitespace only.
    EmptyTitle,
    /// Creation timestamp is before the Unix epoch.
    NegativeTimestamp(i64),
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NegativeTimestamp(value) => {
                write!(f, "creation timestamp must not be negative, got {value}")
            }
        }
    }
}

impl Error for TodoValidationError {}

impl Todo {
    /// Creates a fresh record with a generated id and the current time.
    ///
    /// The title is kept as given; call [`Todo::validate`] before persisting.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, now_epoch_ms())
    }

    /// Creates a record with caller-provided identity and timestamp.
    pub fn with_id(id: TodoId, title: impl Into<String>, creation_timestamp: i64) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            creation_timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), TodoValidationError> {
        validate_title(&self.title)?;
        if self.creation_timestamp < 0 {
            return Err(TodoValidationError::NegativeTimestamp(
                self.creation_timestamp,
            ));
        }
        Ok(())
    }
}

/// Rejects titles that are empty after trimming.
pub fn validate_title(title: &str) -> Result<(), TodoValidationError> {
    if title.trim().is_empty() {
        return Err(TodoValidationError::EmptyTitle);
    }
    Ok(())
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::{validate_title, Todo, TodoValidationError};

    #[test]
    fn new_todo_starts_incomplete() {
        let todo = Todo::new("Buy milk");
        assert!(!todo.completed);
        assert!(todo.creation_timestamp > 0);
        assert!(todo.validate().is_ok());
    }

    #[test]
    fn whitespace_title_is_rejected() {
        assert_eq!(validate_title("   \t"), Err(TodoValidationError::EmptyTitle));
        assert_eq!(
            Todo::new("").validate(),
            Err(TodoValidationError::EmptyTitle)
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let todo = Todo::with_id(uuid::Uuid::nil(), "A", 42);
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["creationTimestamp"], 42);
        assert_eq!(json["completed"], false);
        assert_eq!(json["title"], "A");
    }
}
