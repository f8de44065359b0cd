//! JSON-file-backed durable key-value store

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::warn;

use super::KeyValueStore;

/// Durable key-value store holding a single JSON object on disk.
///
/// The file is read once at open and kept in memory; every write flushes the
/// whole object back. The values here are small (a duration list, a policy,
/// a URL-keyed timer map), so whole-file writes are fine.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(
                        "Storage file {} is not a JSON object, starting fresh",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    async fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.flush(&values).await
    }
}
