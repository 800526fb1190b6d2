use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde_json::{Map, Value};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

use super::KeyValueStore;

/// The main realization of [KeyValueStore]. A namespace is one JSON object stored in
/// `<dir>/<namespace>.json`.
///
/// Writers replace the whole file through a temporary file and a rename, so a reader never sees
/// a half written object. Reads and writes are serialized between processes through an advisory
/// lock on `<dir>/<namespace>.lock`.
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: &Path, namespace: &str) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(dir)?;

        Ok(Self {
            path: dir.join(format!("{namespace}.json")),
            lock_path: dir.join(format!("{namespace}.lock")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock_file(&self) -> Result<File> {
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .await
            .with_context(|| format!("Failed to open lock file {:?}", self.lock_path))?;
        Ok(file)
    }

    /// Reads the namespace object. A missing file is an empty namespace, and so is a corrupt
    /// one: it gets replaced on the next write.
    async fn read_object(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", self.path)),
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(other) => {
                warn!("Expected an object in {:?}, found {other}", self.path);
                Ok(Map::new())
            }
            Err(e) => {
                warn!("During parsing of {:?} found illegal json: {e}", self.path);
                Ok(Map::new())
            }
        }
    }

    async fn write_object(&self, object: &Map<String, Value>) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let buffer = serde_json::to_vec_pretty(object)?;

        let mut file = File::create(&tmp_path).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }

    async fn modify(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let lock = self.lock_file().await?;
        // Semi-safe acquire-release, same as any other writer of this namespace
        lock.lock_exclusive()?;
        let result = async {
            let mut object = self.read_object().await?;
            f(&mut object);
            self.write_object(&object).await
        }
        .await;
        lock.unlock_async().await?;
        result
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        debug!("Reading {key} from {:?}", self.path);
        let lock = self.lock_file().await?;
        lock.lock_shared()?;
        let result = self.read_object().await;
        lock.unlock_async().await?;

        Ok(result?.remove(key))
    }

    async fn put(&self, entries: Vec<(String, Value)>) -> Result<()> {
        self.modify(|object| {
            for (key, value) in entries {
                object.insert(key, value);
            }
        })
        .await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        self.modify(|object| {
            for key in keys {
                object.remove(*key);
            }
        })
        .await
    }
}
