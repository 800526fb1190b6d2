//! Key-value persistence.
//!
//! Everything the application remembers between runs is a handful of keys grouped into
//! namespaces:
//!  - `time_event_repository` holds the event log under a single `events` key.
//!  - `overlay_settings` holds the floating button's flags, position and appearance.
//!
//! [KeyValueStore] abstracts the backing storage, [file::JsonFileStore] is the on-disk
//! implementation and [preferences::Preferences] adds typed accessors with defaults.

pub mod file;
pub mod memory;
pub mod preferences;

use std::future::Future;

use anyhow::Result;
use serde_json::Value;

/// Interface for abstracting storage of a single namespace of keys.
pub trait KeyValueStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>>;

    /// Writes all entries at once. Either every entry is stored or none is.
    fn put(&self, entries: Vec<(String, Value)>) -> impl Future<Output = Result<()>>;

    /// Removes keys. Missing keys are ignored.
    fn remove(&self, keys: &[&str]) -> impl Future<Output = Result<()>>;
}
