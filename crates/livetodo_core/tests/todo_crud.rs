use livetodo_core::db::open_db_in_memory;
use livetodo_core::{
    RepoError, SqliteTodoRepository, Todo, TodoRepository, TodoService, TodoServiceError,
    TodoValidationError,
};
use rusqlite::params;
use uuid::Uuid;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let todo = Todo::new("first todo");
    let id = repo.insert_todo(&todo).unwrap();

    let loaded = repo.get_todo(id).unwrap().unwrap();
    assert_eq!(loaded, todo);
    assert!(!loaded.completed);
}

#[test]
fn get_missing_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    assert!(repo.get_todo(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn insert_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let err = repo.insert_todo(&Todo::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::EmptyTitle)
    ));
    assert!(repo.list_todos().unwrap().is_empty());
}

#[test]
fn list_orders_by_creation_time_descending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let old = Todo::with_id(Uuid::new_v4(), "old", 1_000);
    let newest = Todo::with_id(Uuid::new_v4(), "newest", 3_000);
    let middle = Todo::with_id(Uuid::new_v4(), "middle", 2_000);
    for todo in [&old, &newest, &middle] {
        repo.insert_todo(todo).unwrap();
    }

    let titles: Vec<String> = repo
        .list_todos()
        .unwrap()
        .into_iter()
        .map(|todo| todo.title)
        .collect();
    assert_eq!(titles, vec!["newest", "middle", "old"]);
}

#[test]
fn equal_timestamps_list_latest_insert_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    for title in ["A", "B", "C"] {
        repo.insert_todo(&Todo::with_id(Uuid::new_v4(), title, 5_000))
            .unwrap();
    }

    let titles: Vec<String> = repo
        .list_todos()
        .unwrap()
        .into_iter()
        .map(|todo| todo.title)
        .collect();
    assert_eq!(titles, vec!["C", "B", "A"]);
}

#[test]
fn toggle_flips_and_reports_new_value() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let id = repo.insert_todo(&Todo::new("flip me")).unwrap();

    assert!(repo.toggle_completed(id).unwrap());
    assert!(repo.get_todo(id).unwrap().unwrap().completed);
    assert!(!repo.toggle_completed(id).unwrap());
    assert!(!repo.get_todo(id).unwrap().unwrap().completed);
}

#[test]
fn toggle_missing_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo.toggle_completed(missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn delete_reports_whether_row_existed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let id = repo.insert_todo(&Todo::new("short lived")).unwrap();

    assert!(repo.delete_todo(id).unwrap());
    assert!(!repo.delete_todo(id).unwrap());
}

#[test]
fn read_path_rejects_corrupted_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO todos (uuid, title, completed, created_at) VALUES (?1, ?2, 0, 1);",
        params!["not-a-uuid", "broken"],
    )
    .unwrap();

    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let err = repo.list_todos().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn service_create_stores_title_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let id = service.create(" padded ").unwrap();
    let todo = service.get(id).unwrap().unwrap();
    assert_eq!(todo.title, " padded ");
    assert!(!todo.completed);
}

#[test]
fn service_maps_not_found_to_exact_message() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let err = service.toggle_complete(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, TodoServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "Todo not found");
}

#[test]
fn service_rejects_whitespace_title_with_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let err = service.create("  ").unwrap_err();
    assert!(matches!(
        err,
        TodoServiceError::Validation(TodoValidationError::EmptyTitle)
    ));
}

#[test]
fn service_clear_all_counts_deleted_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    assert_eq!(service.clear_all().unwrap().deleted, 0);
    service.create("one").unwrap();
    service.create("two").unwrap();
    assert_eq!(service.clear_all().unwrap().deleted, 2);
    assert!(service.list().unwrap().is_empty());
}
