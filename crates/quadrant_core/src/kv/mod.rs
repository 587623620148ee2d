//! Durable key-value slots.
//!
//! # Responsibility
//! - Define the `KvStore` contract used by the task/habit store.
//! - Provide best-effort typed `load_slot`/`save_slot` helpers.
//!
//! # Invariants
//! - `load_slot` never fails: missing, unreadable or undecodable slots yield
//!   the caller's default.
//! - An array-shaped default is never replaced by a non-array value.
//! - `save_slot` never fails: write errors are logged and dropped.
//! - Slots are independent; there is no cross-slot transaction.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::DbError;

mod memory;
pub mod slots;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "slot encoding failed: {err}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for KvError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Raw string slot storage.
pub trait KvStore: Send {
    fn read(&self, key: &str) -> KvResult<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&mut self, key: &str) -> KvResult<()>;
    fn clear(&mut self) -> KvResult<()>;
    fn keys(&self) -> KvResult<Vec<String>>;
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> KvResult<()> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        (**self).remove(key)
    }

    fn clear(&mut self) -> KvResult<()> {
        (**self).clear()
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        (**self).keys()
    }
}

/// Reads and decodes one slot, falling back to `default` on any failure.
pub fn load_slot<T, S>(store: &S, key: &str, default: T) -> T
where
    T: Serialize + DeserializeOwned,
    S: KvStore + ?Sized,
{
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("event=slot_load module=kv status=skip key={key} reason=missing");
            return default;
        }
        Err(err) => {
            warn!("event=slot_load module=kv status=error key={key} error_code=read_failed error={err}");
            return default;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("event=slot_load module=kv status=error key={key} error_code=invalid_json error={err}");
            return default;
        }
    };

    if expects_array(&default) && !value.is_array() {
        warn!("event=slot_load module=kv status=error key={key} error_code=shape_mismatch");
        return default;
    }

    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("event=slot_load module=kv status=error key={key} error_code=decode_failed error={err}");
            default
        }
    }
}

/// Encodes and writes one slot. Failures are logged, never returned.
pub fn save_slot<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!("event=slot_save module=kv status=error key={key} error_code=encode_failed error={err}");
            return;
        }
    };
    match store.write(key, &encoded) {
        Ok(()) => debug!(
            "event=slot_save module=kv status=ok key={key} bytes={}",
            encoded.len()
        ),
        Err(err) => {
            warn!("event=slot_save module=kv status=error key={key} error_code=write_failed error={err}")
        }
    }
}

/// Removes every slot. Used by the fatal-fault reset path.
pub fn wipe_all_slots<S: KvStore + ?Sized>(store: &mut S) -> KvResult<()> {
    let count = store.keys()?.len();
    store.clear()?;
    warn!("event=slot_wipe module=kv status=ok slot_count={count}");
    Ok(())
}

fn expects_array<T: Serialize>(default: &T) -> bool {
    serde_json::to_value(default)
        .map(|value| value.is_array())
        .unwrap_or(false)
}
