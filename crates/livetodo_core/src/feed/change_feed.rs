//! In-process subscription registry keyed by query shape.
//!
//! Each subscription owns the receiving end of a channel; the writer side is
//! kept in the registry and fed on every committed change. Affected
//! subscriptions are resolved conservatively: anything that reads the
//! written collection is notified.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Name of the only collection in the store.
pub const TODOS_COLLECTION: &str = "todos";

/// Shape of a live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    /// Full todo list, newest first.
    TodoList,
}

impl QueryKey {
    /// Collection this query reads from.
    pub fn collection(self) -> &'static str {
        match self {
            Self::TodoList => TODOS_COLLECTION,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TodoList => "todo_list",
        }
    }
}

/// Kind of write that produced a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Toggled,
    Removed,
    Cleared,
    /// Another connection committed to the same database file.
    External,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Toggled => "toggled",
            Self::Removed => "removed",
            Self::Cleared => "cleared",
            Self::External => "external",
        }
    }
}

/// Message delivered to subscriptions after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub collection: String,
    pub kind: ChangeKind,
    /// Feed-wide publish counter, strictly increasing. Concurrent writers
    /// may publish in a different order than they committed.
    pub version: u64,
}

/// Subscription registry failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// A thread panicked while holding the registry lock.
    Poisoned,
    /// The registry side of the subscription is gone.
    Closed,
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poisoned => write!(f, "change feed registry lock poisoned"),
            Self::Closed => write!(f, "change feed closed"),
        }
    }
}

impl Error for FeedError {}

struct Subscriber {
    key: QueryKey,
    tx: Sender<ChangeNotice>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    version: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Process-local publish/subscribe hub.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live query and returns its notice stream.
    pub fn subscribe(&self, key: QueryKey) -> Result<Subscription, FeedError> {
        let (tx, rx) = mpsc::channel();
        let mut registry = lock(&self.registry)?;
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.insert(id, Subscriber { key, tx });
        debug!(
            "event=feed_subscribe module=feed status=ok subscription_id={id} query={} active={}",
            key.as_str(),
            registry.subscribers.len()
        );

        Ok(Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Notifies every subscription reading `collection`.
    ///
    /// Returns the number of subscriptions notified.
    pub fn publish(&self, collection: &str, kind: ChangeKind) -> Result<usize, FeedError> {
        let mut registry = lock(&self.registry)?;
        registry.version += 1;
        let notice = ChangeNotice {
            collection: collection.to_string(),
            kind,
            version: registry.version,
        };

        let mut delivered = 0;
        let mut disconnected = Vec::new();
        for (id, subscriber) in &registry.subscribers {
            if subscriber.key.collection() != collection {
                continue;
            }
            match subscriber.tx.send(notice.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => disconnected.push(*id),
            }
        }
        for id in &disconnected {
            registry.subscribers.remove(id);
        }
        if !disconnected.is_empty() {
            warn!(
                "event=feed_prune module=feed status=ok pruned={}",
                disconnected.len()
            );
        }

        debug!(
            "event=feed_publish module=feed status=ok collection={collection} kind={} version={} delivered={delivered}",
            kind.as_str(),
            notice.version
        );
        Ok(delivered)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> Result<usize, FeedError> {
        Ok(lock(&self.registry)?.subscribers.len())
    }

    /// Latest published version; `0` before the first publish.
    pub fn version(&self) -> Result<u64, FeedError> {
        Ok(lock(&self.registry)?.version)
    }
}

/// Live binding between a query shape and its change notices.
///
/// Dropping the subscription unregisters it.
pub struct Subscription {
    id: u64,
    rx: Receiver<ChangeNotice>,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    /// Takes every pending notice without blocking.
    pub fn drain(&self) -> Vec<ChangeNotice> {
        self.rx.try_iter().collect()
    }

    /// Blocks until one notice arrives or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout.
    pub fn wait(&self, timeout: Duration) -> Result<Option<ChangeNotice>, FeedError> {
        match self.rx.recv_timeout(timeout) {
            Ok(notice) => Ok(Some(notice)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(FeedError::Closed),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Poisoned registry: the sender is pruned on the next publish instead.
        if let Ok(mut registry) = self.registry.lock() {
            registry.subscribers.remove(&self.id);
            debug!(
                "event=feed_unsubscribe module=feed status=ok subscription_id={} active={}",
                self.id,
                registry.subscribers.len()
            );
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> Result<MutexGuard<'_, Registry>, FeedError> {
    registry.lock().map_err(|_| FeedError::Poisoned)
}
