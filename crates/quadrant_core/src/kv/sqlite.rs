//! SQLite-backed slot storage.
//!
//! # Invariants
//! - The wrapped connection has a current schema (`kv_slots` exists).
//! - A write replaces the whole slot value (upsert by key).

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{KvResult, KvStore};
use crate::db::{open_db, open_db_in_memory};

pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens (and migrates) the slot database at `path`.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> KvResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KvStore for SqliteKvStore {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_slots WHERE key = ?1;", params![key])?;
        Ok(())
    }

    fn clear(&mut self) -> KvResult<()> {
        self.conn.execute("DELETE FROM kv_slots;", [])?;
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_slots ORDER BY key;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
