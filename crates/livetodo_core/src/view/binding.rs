//! Reactive todo list binding.
//!
//! Lifecycle: `Unsubscribed -> Loading -> Ready`. `Ready` persists across
//! every later write; re-lists happen transparently on `sync`.

use crate::feed::change_feed::Subscription;
use crate::model::todo::{Todo, TodoId};
use crate::store::{StoreResult, TodoStore};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Subscription state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unsubscribed,
    /// Subscribed, first `list()` result not yet applied.
    Loading,
    Ready,
}

/// One view bound to the live todo list of a store.
pub struct TodoView<'store> {
    store: &'store TodoStore,
    state: ViewState,
    subscription: Option<Subscription>,
    items: Vec<Todo>,
    input: String,
    submit_pending: bool,
    /// Notices were consumed but no re-list has succeeded since.
    stale: bool,
    renders: u64,
}

impl<'store> TodoView<'store> {
    pub fn new(store: &'store TodoStore) -> Self {
        Self {
            store,
            state: ViewState::Unsubscribed,
            subscription: None,
            items: Vec::new(),
            input: String::new(),
            submit_pending: false,
            stale: false,
            renders: 0,
        }
    }

    /// Subscribes and blocks until the first result set is applied.
    ///
    /// Subscribing happens before the initial read, so no commit between the
    /// two can be missed. Mounting an already mounted view is a no-op.
    pub fn mount(&mut self) -> StoreResult<()> {
        if self.state != ViewState::Unsubscribed {
            return Ok(());
        }

        self.subscription = Some(self.store.subscribe_list()?);
        self.state = ViewState::Loading;

        match self.store.list() {
            Ok(items) => {
                self.apply(items);
                self.state = ViewState::Ready;
                Ok(())
            }
            Err(err) => {
                self.subscription = None;
                self.state = ViewState::Unsubscribed;
                Err(err)
            }
        }
    }

    /// Drops the subscription. Writes already issued still take effect.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.state = ViewState::Unsubscribed;
        self.items.clear();
        self.submit_pending = false;
        self.stale = false;
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Current items, or `None` until the first result has arrived.
    pub fn items(&self) -> Option<&[Todo]> {
        match self.state {
            ViewState::Ready => Some(&self.items),
            ViewState::Unsubscribed | ViewState::Loading => None,
        }
    }

    /// Number of times the item list actually changed on screen.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Re-lists if any change notice arrived since the last successful
    /// re-list.
    ///
    /// Returns whether the visible items changed. A failed re-list keeps the
    /// view stale, so the next call retries even without a new notice.
    pub fn sync(&mut self) -> StoreResult<bool> {
        let pending = match &self.subscription {
            Some(subscription) => subscription.drain().len(),
            None => return Ok(false),
        };
        if pending > 0 {
            self.stale = true;
        }
        if !self.stale {
            return Ok(false);
        }
        self.relist()
    }

    /// Blocks up to `timeout` for a change notice, then syncs.
    ///
    /// Returns whether the visible items changed.
    pub fn wait_for_change(&mut self, timeout: Duration) -> StoreResult<bool> {
        if self.stale && self.subscription.is_some() {
            return self.sync();
        }
        let notice = match &self.subscription {
            Some(subscription) => subscription.wait(timeout)?,
            None => return Ok(false),
        };
        if notice.is_none() {
            return Ok(false);
        }
        self.stale = true;
        // Coalesce whatever else queued up behind the first notice.
        self.sync()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.state == ViewState::Ready
            && !self.submit_pending
            && !normalize_input(&self.input).is_empty()
    }

    /// Issues `create` for the current input.
    ///
    /// Returns `Ok(None)` without contacting the store when the control is
    /// disabled. On success the input is cleared and the control stays
    /// disabled until the next re-list.
    pub fn submit(&mut self) -> StoreResult<Option<TodoId>> {
        if !self.can_submit() {
            return Ok(None);
        }

        let title = normalize_input(&self.input);
        self.submit_pending = true;
        match self.store.create(&title) {
            Ok(id) => {
                self.input.clear();
                Ok(Some(id))
            }
            Err(err) => {
                self.submit_pending = false;
                Err(err)
            }
        }
    }

    /// Flips completion of `id`. The view updates on the next sync.
    pub fn toggle(&self, id: TodoId) -> StoreResult<()> {
        self.store.toggle_complete(id).map(|_| ())
    }

    /// Deletes `id`. The view updates on the next sync.
    pub fn remove(&self, id: TodoId) -> StoreResult<()> {
        self.store.remove(id).map(|_| ())
    }

    /// One display line per item, in list order.
    pub fn render(&self) -> Vec<String> {
        self.items().map_or_else(Vec::new, |items| {
            items.iter().map(render_line).collect()
        })
    }

    fn relist(&mut self) -> StoreResult<bool> {
        let items = self.store.list()?;
        self.stale = false;
        self.submit_pending = false;
        Ok(self.apply(items))
    }

    fn apply(&mut self, items: Vec<Todo>) -> bool {
        if self.state == ViewState::Ready && items == self.items {
            debug!("event=view_sync module=view status=ok changed=false");
            return false;
        }
        self.items = items;
        self.renders += 1;
        debug!(
            "event=view_sync module=view status=ok changed=true items={}",
            self.items.len()
        );
        true
    }
}

/// Collapses whitespace runs and trims both ends.
pub fn normalize_input(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

fn render_line(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    format!("[{mark}] {}", todo.title)
}
