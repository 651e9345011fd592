//! Local key-value persistence for cached summaries
//!
//! Values are JSON so the on-disk file stays readable and matches what the
//! browser extension kept in its local storage area.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::DigestError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, DigestError>;

    /// Inserts or replaces the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), DigestError>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DigestError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DigestError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// All entries in one JSON object on disk.
///
/// Every write rewrites the file through a sibling temp file and a rename, so a
/// crash leaves either the old or the new contents. Access from this process is
/// serialized by an internal lock.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// File contents, or `None` when there is nothing stored yet.
    async fn read_raw(&self) -> Result<Option<String>, DigestError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DigestError::StorageError(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, DigestError> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(Map::new());
        };
        Self::decode(&raw)
            .map_err(|e| DigestError::StorageError(format!("{}: {e}", self.path.display())))
    }

    /// Like `load`, but a file that cannot be decoded is moved to
    /// `<path>.corrupt` and replaced by an empty map, so writes keep working.
    async fn load_for_write(&self) -> Result<Map<String, Value>, DigestError> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(Map::new());
        };
        match Self::decode(&raw) {
            Ok(map) => Ok(map),
            Err(reason) => {
                let aside = self.sibling(".corrupt");
                warn!(
                    "Discarding unreadable summary cache {}, moved to {}: {}",
                    self.path.display(),
                    aside.display(),
                    reason
                );
                tokio::fs::rename(&self.path, &aside).await?;
                Ok(Map::new())
            }
        }
    }

    fn decode(raw: &str) -> Result<Map<String, Value>, String> {
        match serde_json::from_str::<Value>(raw).map_err(|e| format!("invalid JSON: {e}"))? {
            Value::Object(map) => Ok(map),
            other => Err(format!(
                "holds a JSON {} instead of an object",
                json_kind(&other)
            )),
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    async fn persist(&self, map: &Map<String, Value>) -> Result<(), DigestError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.sibling(".tmp");

        let body = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Persisted {} cache entries to {}", map.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DigestError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DigestError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load_for_write().await?;
        map.insert(key.to_string(), value);
        self.persist(&map).await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
