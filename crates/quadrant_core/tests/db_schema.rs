use quadrant_core::db::schema::schema_version;
use quadrant_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn in_memory_database_starts_at_current_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), schema_version());
    assert_table_exists(&conn, "kv_slots");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quadrant.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO kv_slots (key, value) VALUES ('language', '\"zh\"');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(user_version(&conn_second), schema_version());
    let value: String = conn_second
        .query_row("SELECT value FROM kv_slots WHERE key = 'language';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(value, "\"zh\"");
}

#[test]
fn database_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, schema_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn user_version(conn: &Connection) -> u32 {
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
