//! Store facade binding handlers to the change feed.

use crate::config::StorageLocation;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::feed::change_feed::{
    ChangeFeed, ChangeKind, FeedError, QueryKey, Subscription, TODOS_COLLECTION,
};
use crate::model::todo::{Todo, TodoId};
use crate::repo::todo_repo::SqliteTodoRepository;
use crate::service::todo_service::{ClearAllResult, TodoService, TodoServiceError};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store handlers.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Service(TodoServiceError),
    Feed(FeedError),
    /// A handler panicked while holding the connection.
    Poisoned,
    /// Global store was already initialized with a different location.
    AlreadyInitialized {
        active: StorageLocation,
        requested: StorageLocation,
    },
}

impl StoreError {
    /// Returns whether this is a `Todo not found` failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service(TodoServiceError::NotFound(_)))
    }

    /// Returns whether this is an input validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Service(TodoServiceError::Validation(_)))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Feed(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "todo store connection lock poisoned"),
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "todo store already initialized at {active:?}; refusing to switch to {requested:?}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Feed(err) => Some(err),
            Self::Poisoned | Self::AlreadyInitialized { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<TodoServiceError> for StoreError {
    fn from(value: TodoServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<FeedError> for StoreError {
    fn from(value: FeedError) -> Self {
        Self::Feed(value)
    }
}

/// Single point of access to the todo collection.
///
/// Handler calls are serialized on one connection, so each call is
/// linearizable and concurrent writes to the same record resolve as
/// last-write-wins.
pub struct TodoStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
    location: StorageLocation,
    /// Last `PRAGMA data_version` seen; only updated under the `conn` lock.
    seen_data_version: AtomicI64,
}

impl TodoStore {
    /// Opens (or creates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Self::from_parts(conn, StorageLocation::File(path))
    }

    /// Opens an empty private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Self::from_parts(conn, StorageLocation::Memory)
    }

    pub fn open_location(location: &StorageLocation) -> StoreResult<Self> {
        match location {
            StorageLocation::File(path) => Self::open(path),
            StorageLocation::Memory => Self::open_in_memory(),
        }
    }

    fn from_parts(conn: Connection, location: StorageLocation) -> StoreResult<Self> {
        let data_version = read_data_version(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
            location,
            seen_data_version: AtomicI64::new(data_version),
        })
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Subscribes to changes of the `list()` result set.
    pub fn subscribe_list(&self) -> StoreResult<Subscription> {
        Ok(self.feed.subscribe(QueryKey::TodoList)?)
    }

    /// Returns all records, newest first.
    pub fn list(&self) -> StoreResult<Vec<Todo>> {
        self.run("todo_list", |service| service.list())
    }

    pub fn get(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        self.run("todo_get", |service| service.get(id))
    }

    /// Inserts a new incomplete record and returns its id.
    pub fn create(&self, title: &str) -> StoreResult<TodoId> {
        let id = self.run("todo_create", |service| service.create(title))?;
        self.notify(ChangeKind::Created);
        Ok(id)
    }

    /// Flips `completed`; fails with `Todo not found` for unknown ids.
    pub fn toggle_complete(&self, id: TodoId) -> StoreResult<bool> {
        let completed = self.run("todo_toggle", |service| service.toggle_complete(id))?;
        self.notify(ChangeKind::Toggled);
        Ok(completed)
    }

    /// Deletes one record; unknown ids are a silent success.
    pub fn remove(&self, id: TodoId) -> StoreResult<bool> {
        let removed = self.run("todo_remove", |service| service.remove(id))?;
        if removed {
            self.notify(ChangeKind::Removed);
        }
        Ok(removed)
    }

    /// Deletes every record and reports how many were removed.
    pub fn clear_all(&self) -> StoreResult<ClearAllResult> {
        let result = self.run("todo_clear_all", |service| service.clear_all())?;
        if result.deleted > 0 {
            self.notify(ChangeKind::Cleared);
        }
        Ok(result)
    }

    /// Publishes a notice when another connection committed to the database
    /// file since the last poll.
    ///
    /// Writes made through this store never count; they notify directly.
    /// Returns whether an outside change was detected.
    pub fn poll_external_changes(&self) -> StoreResult<bool> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let current = read_data_version(&conn)?;
        let previous = self.seen_data_version.swap(current, Ordering::SeqCst);
        drop(conn);

        if current == previous {
            return Ok(false);
        }
        info!(
            "event=store_external_change module=store status=ok data_version={current}"
        );
        self.notify(ChangeKind::External);
        Ok(true)
    }

    fn run<T>(
        &self,
        event: &'static str,
        handler: impl FnOnce(
            &TodoService<SqliteTodoRepository<'_>>,
        ) -> Result<T, TodoServiceError>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let conn = self.conn.lock().map_err(|_| {
            error!("event={event} module=store status=error error_code=lock_poisoned");
            StoreError::Poisoned
        })?;

        let result = SqliteTodoRepository::try_new(&conn)
            .map_err(TodoServiceError::from)
            .and_then(|repo| handler(&TodoService::new(repo)));

        match result {
            Ok(value) => {
                info!(
                    "event={event} module=store status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event={event} module=store status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    error_code(&err),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn notify(&self, kind: ChangeKind) {
        // The write is already committed; a feed failure must not undo it.
        if let Err(err) = self.feed.publish(TODOS_COLLECTION, kind) {
            error!(
                "event=feed_publish module=store status=error kind={} error={}",
                kind.as_str(),
                err
            );
        }
    }
}

fn read_data_version(conn: &Connection) -> StoreResult<i64> {
    let version = conn
        .query_row("PRAGMA data_version;", [], |row| row.get::<_, i64>(0))
        .map_err(DbError::from)?;
    Ok(version)
}

fn error_code(err: &TodoServiceError) -> &'static str {
    match err {
        TodoServiceError::Validation(_) => "validation",
        TodoServiceError::NotFound(_) => "not_found",
        TodoServiceError::Repo(_) => "repo",
    }
}
