//! Process-wide store instance.
//!
//! Initialized explicitly once; lives until process exit.

use super::todo_store::{StoreError, StoreResult, TodoStore};
use crate::config::CoreConfig;
use log::info;
use once_cell::sync::OnceCell;

static GLOBAL_STORE: OnceCell<TodoStore> = OnceCell::new();

/// Opens the process-wide store described by `config`.
///
/// Repeated calls with the same storage location return the existing store.
/// A call with a different location is rejected.
pub fn init_global_store(config: &CoreConfig) -> StoreResult<&'static TodoStore> {
    let store = GLOBAL_STORE.get_or_try_init(|| {
        let store = TodoStore::open_location(&config.storage)?;
        info!(
            "event=store_init module=store status=ok location={:?}",
            store.location()
        );
        Ok::<_, StoreError>(store)
    })?;

    if store.location() != &config.storage {
        return Err(StoreError::AlreadyInitialized {
            active: store.location().clone(),
            requested: config.storage.clone(),
        });
    }
    Ok(store)
}

/// Returns the process-wide store, if initialized.
pub fn global_store() -> Option<&'static TodoStore> {
    GLOBAL_STORE.get()
}
