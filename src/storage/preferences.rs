use anyhow::Result;
use serde_json::Value;
use tracing::warn;

use super::KeyValueStore;

/// Typed view over a [KeyValueStore]. Getters never fail: an unreadable namespace, a missing key
/// or a value of the wrong type all resolve to the supplied default.
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn get_value(&self, key: &str) -> Option<Value> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read preference {key}: {e:?}");
                None
            }
        }
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_value(key)
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub async fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get_value(key)
            .await
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    pub async fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.get_value(key)
            .await
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    pub async fn get_string(&self, key: &str, default: &str) -> String {
        match self.get_value(key).await {
            Some(Value::String(v)) => v,
            _ => default.to_string(),
        }
    }

    pub async fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.store.put(vec![(key.to_string(), Value::from(value))]).await
    }

    pub async fn put_i32(&self, key: &str, value: i32) -> Result<()> {
        self.store.put(vec![(key.to_string(), Value::from(value))]).await
    }

    pub async fn put_f32(&self, key: &str, value: f32) -> Result<()> {
        self.store.put(vec![(key.to_string(), Value::from(value as f64))]).await
    }

    pub async fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.store.put(vec![(key.to_string(), Value::from(value))]).await
    }

    /// Stores several keys in one write.
    pub async fn put_all(&self, entries: Vec<(&str, Value)>) -> Result<()> {
        self.store
            .put(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            )
            .await
    }

    pub async fn remove(&self, keys: &[&str]) -> Result<()> {
        self.store.remove(keys).await
    }
}
