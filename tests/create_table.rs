use rustql::{process_query, Database};

fn scratch_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.db");
    let db = Database::open(&path, rustql::page::PAGE_SIZE as u16).unwrap();
    (dir, db)
}

#[test]
fn create_table_reports_initial_page_count() {
    let (_dir, mut db) = scratch_db();
    process_query(&mut db, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)").unwrap();
    // page 0 (header) + page 1 (catalog) + 1 fresh leaf for the new tree.
    db.close().unwrap();
}

#[test]
fn duplicate_table_name_rejected_case_insensitively() {
    let (_dir, mut db) = scratch_db();
    process_query(&mut db, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
    let err = process_query(&mut db, "CREATE TABLE USERS (id INTEGER PRIMARY KEY)").unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.db");
    {
        let mut db = Database::open(&path, rustql::page::PAGE_SIZE as u16).unwrap();
        process_query(&mut db, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
        process_query(&mut db, "INSERT INTO users (id, name) VALUES (1, 'Alice')").unwrap();
        db.close().unwrap();
    }
    let mut db = Database::open(&path, rustql::page::PAGE_SIZE as u16).unwrap();
    let result = process_query(&mut db, "SELECT * FROM users").unwrap();
    match result {
        rustql::executor::ExecResult::Rows { rows, .. } => assert_eq!(rows.len(), 1),
        other => panic!("expected rows, got {other:?}"),
    }
}
