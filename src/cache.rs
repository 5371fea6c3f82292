//! Memoized metadata responses.
//!
//! Entries never expire. Once a response is written it is trusted on every later run,
//! including responses where the API reported the title as not found.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    async fn put(&self, key: &str, value: &Value) -> AppResult<()>;
}

/// Stable, filesystem-safe key for a title lookup.
pub fn cache_key(title: &str, year: Option<i32>) -> String {
    let raw = match year {
        Some(year) => format!("{title}__{year}"),
        None => title.to_string(),
    };
    raw.replace(['/', '\\', '\0'], "_")
}

/// One `<key>.json` file per entry.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl MetadataStore for FileStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let bytes = match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn put(&self, key: &str, value: &Value) -> AppResult<()> {
        tokio::fs::write(self.path_for(key), serde_json::to_vec(value)?).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> AppResult<()> {
        let mut entries =
            self.entries.lock().map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_includes_year_when_known() {
        assert_eq!(cache_key("Toy Story", Some(1995)), "Toy Story__1995");
        assert_eq!(cache_key("Heat", None), "Heat");
    }

    #[test]
    fn key_replaces_path_separators() {
        assert_eq!(cache_key("Face/Off", Some(1997)), "Face_Off__1997");
        assert_eq!(cache_key(r"AC\DC", None), "AC_DC");
    }

    #[tokio::test]
    async fn file_store_round_trips_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = cache_key("Face/Off", Some(1997));
        let value = json!({"Response": "True", "imdbID": "tt0119094"});

        let store = FileStore::open(dir.path().join("cache")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
        store.put(&key, &value).await.unwrap();
        assert!(store.dir().join("Face_Off__1997.json").exists());

        let reopened = FileStore::open(dir.path().join("cache")).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("Heat.json"), b"{not json").unwrap();

        assert!(store.get("Heat").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.put("Heat", &json!({"Response": "False"})).await.unwrap();
        store.put("Heat", &json!({"Response": "True"})).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Heat").await.unwrap(), Some(json!({"Response": "True"})));
    }
}
