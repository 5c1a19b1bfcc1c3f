//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the storage primitives behind the list/create/toggle/remove/
//!   clear handlers.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing is always `created_at DESC, seq DESC`.
//! - Toggling is a single atomic statement; no read-modify-write.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::todo::{Todo, TodoId, TodoValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    completed,
    created_at
FROM todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    /// Connection was handed over before migrations ran.
    SchemaNotReady { found: u32, expected: u32 },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::SchemaNotReady { found, expected } => write!(
                f,
                "todo schema version {found} does not match expected {expected}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for the todo collection.
pub trait TodoRepository {
    /// Returns every record, newest first.
    fn list_todos(&self) -> RepoResult<Vec<Todo>>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Persists a validated record and returns its id.
    fn insert_todo(&self, todo: &Todo) -> RepoResult<TodoId>;
    /// Flips `completed` and returns the new value.
    fn toggle_completed(&self, id: TodoId) -> RepoResult<bool>;
    /// Returns whether a row was removed.
    fn delete_todo(&self, id: TodoId) -> RepoResult<bool>;
    /// Returns the number of rows removed.
    fn delete_all(&self) -> RepoResult<usize>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails with `SchemaNotReady` when the connection did not come through
    /// `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected = latest_version();
        if found != expected {
            return Err(RepoError::SchemaNotReady { found, expected });
        }
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL} ORDER BY created_at DESC, seq DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();

        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(todos)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }

        Ok(None)
    }

    fn insert_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (uuid, title, completed, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                todo.id.to_string(),
                todo.title.as_str(),
                bool_to_int(todo.completed),
                todo.creation_timestamp,
            ],
        )?;

        Ok(todo.id)
    }

    fn toggle_completed(&self, id: TodoId) -> RepoResult<bool> {
        let completed = self
            .conn
            .query_row(
                "UPDATE todos
                 SET completed = 1 - completed
                 WHERE uuid = ?1
                 RETURNING completed;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match completed {
            Some(value) => int_to_bool(value, "completed"),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM todos;", [])?;
        Ok(changed)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in todos.uuid"))
    })?;

    let todo = Todo {
        id,
        title: row.get("title")?,
        completed: int_to_bool(row.get("completed")?, "completed")?,
        creation_timestamp: row.get("created_at")?,
    };
    todo.validate().map_err(|err| {
        RepoError::InvalidData(format!("todo {} failed validation: {err}", todo.id))
    })?;
    Ok(todo)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in todos.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
