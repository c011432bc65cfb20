use daylog_core::db::migrations::latest_version;
use daylog_core::db::{open_db, open_db_in_memory, DbError, OpenMode};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "journals",
        "time_sections",
        "health_records",
        "achievements",
        "app_identity",
    ] {
        assert_table_exists(&conn, table);
    }
    assert_column_exists(&conn, "time_sections", "activity_notes");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daylog.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "journals");
}

#[test]
fn version_one_database_is_upgraded_with_empty_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch(
        "PRAGMA user_version = 1;
         INSERT INTO journals (id, date, mood) VALUES ('j1', '2024-05-01', 'Okay');
         INSERT INTO time_sections (id, journal_id, section_type) VALUES ('s1', 'j1', 'morning');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let notes: String = conn
        .query_row(
            "SELECT activity_notes FROM time_sections WHERE id = 's1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(notes, "{}");
}

#[test]
fn unreadable_file_reports_open_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("daylog.db");

    match open_db(&path).unwrap_err() {
        DbError::Open { mode, .. } => assert_eq!(mode, OpenMode::File),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM pragma_table_info(?1)
                WHERE name = ?2
            );",
            [table_name, column],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "column {table_name}.{column} does not exist");
}
