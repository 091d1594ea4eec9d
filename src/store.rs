//! File-backed stores.
//!
//! Documents live in one JSON object per collection path, so
//! `locations/1/comments` is `<root>/locations/1/comments.json`. Device values
//! live in a single JSON object file. Writes go through a temp file and a
//! rename. Generated document ids are the store clock's UTC microseconds in
//! hex.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result, anyhow};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::traits::{Clock, Document, DocumentStore, KeyValueStore, SystemClock};

fn acquire(lock: &Mutex<()>) -> Result<MutexGuard<'_, ()>> {
    lock.lock().map_err(|_| anyhow!("Store lock poisoned"))
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt store file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(value).context("Failed to serialize store file")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

// ==================== Document Store ====================

#[derive(Debug)]
pub struct FileDocumentStore<C: Clock = SystemClock> {
    root: PathBuf,
    clock: C,
    lock: Mutex<()>,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, SystemClock::default())
    }
}

impl<C: Clock> FileDocumentStore<C> {
    pub fn with_clock(root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            root: root.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection.split('/').all(|segment| {
                !segment.is_empty()
                    && !segment.starts_with('.')
                    && !segment.contains(['\\', ':'])
            });
        if !valid {
            anyhow::bail!("Invalid collection path {collection:?}");
        }
        Ok(self.root.join(format!("{collection}.json")))
    }

    fn read(&self, collection: &str) -> Result<BTreeMap<String, Value>> {
        read_json(&self.collection_path(collection)?)
    }
}

impl<C: Clock> DocumentStore for FileDocumentStore<C> {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let _guard = acquire(&self.lock)?;
        Ok(self.read(collection)?.remove(id).map(|data| Document {
            id: id.to_string(),
            data,
        }))
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let _guard = acquire(&self.lock)?;
        Ok(self
            .read(collection)?
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    fn add(&self, collection: &str, record: Value) -> Result<String> {
        let _guard = acquire(&self.lock)?;
        let path = self.collection_path(collection)?;
        let mut docs: BTreeMap<String, Value> = read_json(&path)?;

        let stamp = self.clock.now_utc().timestamp_micros();
        let mut id = format!("{stamp:x}");
        let mut suffix = 0u32;
        while docs.contains_key(&id) {
            suffix += 1;
            id = format!("{stamp:x}-{suffix}");
        }

        docs.insert(id.clone(), record);
        write_json(&path, &docs)?;
        Ok(id)
    }

    fn set(&self, collection: &str, id: &str, record: Value) -> Result<()> {
        let _guard = acquire(&self.lock)?;
        let path = self.collection_path(collection)?;
        let mut docs: BTreeMap<String, Value> = read_json(&path)?;
        docs.insert(id.to_string(), record);
        write_json(&path, &docs)
    }
}

// ==================== Key-Value Store ====================

#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = acquire(&self.lock)?;
        let mut values: BTreeMap<String, String> = read_json(&self.path)?;
        Ok(values.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = acquire(&self.lock)?;
        let mut values: BTreeMap<String, String> = read_json(&self.path)?;
        values.insert(key.to_string(), value.to_string());
        write_json(&self.path, &values)
    }
}
