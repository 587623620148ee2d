use std::collections::BTreeMap;

use super::{KvResult, KvStore};

/// Process-local slot storage. Nothing survives the value being dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    slots: BTreeMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.slots.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> KvResult<()> {
        self.slots.clear();
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        Ok(self.slots.keys().cloned().collect())
    }
}
