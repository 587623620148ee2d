//! Slot table schema, versioned through `PRAGMA user_version`.
//!
//! Each entry in `SCHEMA_STEPS` upgrades the database by one version; the
//! step at index `n` produces version `n + 1`. Steps are append-only.

use log::info;
use rusqlite::Connection;

use super::{DbError, DbResult};

const SCHEMA_STEPS: &[&str] = &[include_str!("sql/0001_kv_slots.sql")];

/// Schema version this build writes.
pub fn schema_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Brings `conn` up to `schema_version()` in one transaction. A database
/// written by a newer build is refused rather than touched.
pub(crate) fn upgrade(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = schema_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &SCHEMA_STEPS[found as usize..] {
        tx.execute_batch(step)?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {supported};"))?;
    tx.commit()?;

    info!("event=db_schema module=db status=ok from={found} to={supported}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn upgrade_is_a_no_op_once_current() {
        let mut conn = Connection::open_in_memory().unwrap();
        upgrade(&mut conn).unwrap();
        conn.execute("INSERT INTO kv_slots (key, value) VALUES ('k', '1');", [])
            .unwrap();

        upgrade(&mut conn).unwrap();
        assert_eq!(user_version(&conn), schema_version());
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn newer_database_is_left_untouched() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 7;").unwrap();

        let err = upgrade(&mut conn).unwrap_err();
        assert!(matches!(err, DbError::SchemaTooNew { found: 7, .. }));
        assert_eq!(user_version(&conn), 7);
        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table';", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(tables, 0);
    }
}
