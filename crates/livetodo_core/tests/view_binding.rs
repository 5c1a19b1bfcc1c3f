use livetodo_core::{TodoStore, TodoView, ViewState};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

fn insert_corrupt_row(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "INSERT INTO todos (uuid, title, completed, created_at)
         VALUES ('not-a-uuid', 'broken', 0, 1);",
        [],
    )
    .unwrap();
}

fn delete_corrupt_row(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute("DELETE FROM todos WHERE uuid = 'not-a-uuid';", [])
        .unwrap();
}

fn titles(view: &TodoView<'_>) -> Vec<String> {
    view.items()
        .unwrap()
        .iter()
        .map(|todo| todo.title.clone())
        .collect()
}

#[test]
fn mount_loads_existing_records() {
    let store = TodoStore::open_in_memory().unwrap();
    store.create("A").unwrap();
    store.create("B").unwrap();

    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(titles(&view), vec!["B", "A"]);
}

#[test]
fn blank_input_issues_no_create() {
    let store = TodoStore::open_in_memory().unwrap();
    let subscription = store.subscribe_list().unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    view.set_input("   \t ");
    assert!(!view.can_submit());
    assert_eq!(view.submit().unwrap(), None);

    assert!(store.list().unwrap().is_empty());
    assert!(subscription.drain().is_empty());
}

#[test]
fn submit_creates_trimmed_title_and_resets_input() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    view.set_input("  Buy   milk ");
    let id = view.submit().unwrap().unwrap();

    assert_eq!(view.input(), "");
    assert_eq!(store.get(id).unwrap().unwrap().title, "Buy milk");
}

#[test]
fn submit_stays_disabled_until_relist() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    view.set_input("first");
    view.submit().unwrap().unwrap();

    view.set_input("second");
    assert!(!view.can_submit());
    assert_eq!(view.submit().unwrap(), None);

    assert!(view.sync().unwrap());
    assert!(view.can_submit());
    view.submit().unwrap().unwrap();
    view.sync().unwrap();
    assert_eq!(titles(&view), vec!["second", "first"]);
}

#[test]
fn submit_before_mount_is_ignored() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut view = TodoView::new(&store);
    view.set_input("too early");

    assert_eq!(view.submit().unwrap(), None);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn toggle_and_remove_apply_only_after_sync() {
    let store = TodoStore::open_in_memory().unwrap();
    let id = store.create("Buy milk").unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    view.toggle(id).unwrap();
    assert!(!view.items().unwrap()[0].completed);
    assert!(view.sync().unwrap());
    assert!(view.items().unwrap()[0].completed);

    view.remove(id).unwrap();
    assert_eq!(view.items().unwrap().len(), 1);
    assert!(view.sync().unwrap());
    assert!(view.items().unwrap().is_empty());
}

#[test]
fn stale_toggle_surfaces_not_found() {
    let store = TodoStore::open_in_memory().unwrap();
    let id = store.create("racy").unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    store.remove(id).unwrap();
    let err = view.toggle(id).unwrap_err();
    assert_eq!(err.to_string(), "Todo not found");
}

#[test]
fn remove_of_unknown_id_is_accepted() {
    let store = TodoStore::open_in_memory().unwrap();
    let view = TodoView::new(&store);
    view.remove(Uuid::new_v4()).unwrap();
}

#[test]
fn writes_from_one_view_reach_every_view() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut writer = TodoView::new(&store);
    let mut reader = TodoView::new(&store);
    writer.mount().unwrap();
    reader.mount().unwrap();

    writer.set_input("shared");
    writer.submit().unwrap();

    assert!(reader.sync().unwrap());
    writer.sync().unwrap();
    assert_eq!(titles(&reader), vec!["shared"]);
    assert_eq!(reader.items(), writer.items());
}

#[test]
fn sync_without_notice_does_not_rerender() {
    let store = TodoStore::open_in_memory().unwrap();
    store.create("steady").unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();
    let renders = view.renders();

    assert!(!view.sync().unwrap());
    assert_eq!(view.renders(), renders);
}

#[test]
fn notice_with_identical_result_does_not_rerender() {
    let store = TodoStore::open_in_memory().unwrap();
    let id = store.create("flicker").unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();
    let renders = view.renders();

    store.toggle_complete(id).unwrap();
    store.toggle_complete(id).unwrap();

    assert!(!view.sync().unwrap());
    assert_eq!(view.renders(), renders);
}

#[test]
fn wait_for_change_picks_up_writes_from_other_threads() {
    let store = Arc::new(TodoStore::open_in_memory().unwrap());
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    let writer = Arc::clone(&store);
    let handle = thread::spawn(move || writer.create("remote").unwrap());

    assert!(view.wait_for_change(Duration::from_secs(5)).unwrap());
    let id = handle.join().unwrap();
    assert_eq!(view.items().unwrap()[0].id, id);
}

#[test]
fn wait_for_change_times_out_quietly() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();
    assert!(!view.wait_for_change(Duration::from_millis(10)).unwrap());
}

#[test]
fn unmount_stops_updates_but_writes_persist() {
    let store = TodoStore::open_in_memory().unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();
    assert_eq!(store.feed().subscriber_count().unwrap(), 1);

    view.set_input("left behind");
    view.submit().unwrap();
    view.unmount();

    assert_eq!(view.state(), ViewState::Unsubscribed);
    assert!(view.items().is_none());
    assert!(!view.sync().unwrap());
    assert_eq!(store.feed().subscriber_count().unwrap(), 0);
    assert_eq!(store.list().unwrap().len(), 1);

    view.mount().unwrap();
    assert_eq!(titles(&view), vec!["left behind"]);
}

#[test]
fn failed_initial_list_returns_to_unsubscribed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");
    let store = TodoStore::open(&path).unwrap();
    insert_corrupt_row(&path);

    let mut view = TodoView::new(&store);
    assert!(view.mount().is_err());

    assert_eq!(view.state(), ViewState::Unsubscribed);
    assert!(view.items().is_none());
    assert_eq!(store.feed().subscriber_count().unwrap(), 0);
}

#[test]
fn failed_relist_is_retried_on_next_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");
    let store = TodoStore::open(&path).unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    view.set_input("mine");
    view.submit().unwrap().unwrap();
    insert_corrupt_row(&path);
    assert!(view.sync().is_err());

    delete_corrupt_row(&path);
    assert!(view.sync().unwrap());
    assert_eq!(titles(&view), vec!["mine"]);

    view.set_input("next");
    assert!(view.can_submit());
    assert!(!view.sync().unwrap());
}

#[test]
fn failed_relist_is_retried_by_wait_for_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");
    let store = TodoStore::open(&path).unwrap();
    let mut view = TodoView::new(&store);
    view.mount().unwrap();

    store.create("queued").unwrap();
    insert_corrupt_row(&path);
    assert!(view.sync().is_err());
    delete_corrupt_row(&path);

    assert!(view.wait_for_change(Duration::from_millis(10)).unwrap());
    assert_eq!(titles(&view), vec!["queued"]);
}

#[test]
fn write_through_another_store_wakes_view_after_poll() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let writer = TodoStore::open(&path).unwrap();
    let watcher = TodoStore::open(&path).unwrap();

    let mut view = TodoView::new(&watcher);
    view.mount().unwrap();
    writer.create("from elsewhere").unwrap();

    assert!(!view.sync().unwrap());
    assert!(watcher.poll_external_changes().unwrap());
    assert!(view.wait_for_change(Duration::from_secs(5)).unwrap());
    assert_eq!(titles(&view), vec!["from elsewhere"]);
}
