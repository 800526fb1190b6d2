use std::sync::Mutex;

use anyhow::Result;
use serde_json::{Map, Value};

use super::KeyValueStore;

/// Non persistent [KeyValueStore]. Hosts that don't need anything to outlive the process (and
/// tests) can use it instead of [super::file::JsonFileStore].
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values().get(key).cloned())
    }

    async fn put(&self, entries: Vec<(String, Value)>) -> Result<()> {
        self.values().extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.values();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
