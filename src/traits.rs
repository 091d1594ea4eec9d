//! Seams for time and the hosted collaborators.
//!
//! This module provides traits for:
//! - `Clock`: current time, localized for open/closed evaluation
//! - `DocumentStore`: collections of JSON documents (buildings, comments)
//! - `KeyValueStore`: small string values on the device (favorites)
//!
//! In-memory implementations live here too so tests can run without disk.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

// ==================== Clock Trait ====================

/// Trait for abstracting time access.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get the current wall-clock time at the campus.
    fn now_local(&self) -> NaiveDateTime;
}

/// System clock, localized to a fixed zone or to the host's zone.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    tz: Option<Tz>,
}

impl SystemClock {
    pub fn new(tz: Option<Tz>) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        match self.tz {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// Mock clock for testing. The wall-clock time is treated as UTC.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Arc<Mutex<NaiveDateTime>>,
}

impl MockClock {
    pub fn new(time: NaiveDateTime) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn set_time(&self, time: NaiveDateTime) {
        *self.time.lock().unwrap() = time;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.time.lock().unwrap();
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.time.lock().unwrap().and_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        *self.time.lock().unwrap()
    }
}

// ==================== Document Store ====================

/// A stored record and its id within its collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Collections of JSON documents addressed by slash-separated paths such as
/// `locations` or `locations/<id>/comments`.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Insert under a newly generated id and return it.
    fn add(&self, collection: &str, record: Value) -> Result<String>;

    /// Insert or replace under a caller-chosen id.
    fn set(&self, collection: &str, id: &str, record: Value) -> Result<()>;
}

/// In-memory document store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<Mutex<HashMap<String, BTreeMap<String, Value>>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn add(&self, collection: &str, record: Value) -> Result<String> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("doc-{:06}", *next)
        };
        self.set(collection, &id, record)?;
        Ok(id)
    }

    fn set(&self, collection: &str, id: &str, record: Value) -> Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }
}

// ==================== Key-Value Store ====================

/// Device-local string storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory key-value store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_system_clock_returns_current_time() {
        let clock = SystemClock::default();
        let before = Utc::now();
        let clock_time = clock.now_utc();
        let after = Utc::now();

        assert!(clock_time >= before);
        assert!(clock_time <= after);
    }

    #[test]
    fn test_system_clock_uses_configured_zone() {
        let clock = SystemClock::new(Some(chrono_tz::UTC));
        let before = Utc::now().naive_utc();
        let local = clock.now_local();
        let after = Utc::now().naive_utc();

        assert!(local >= before && local <= after);
    }

    #[test]
    fn test_mock_clock_returns_set_time() {
        let clock = MockClock::new(noon());
        assert_eq!(clock.now_local(), noon());
        assert_eq!(clock.now_utc(), noon().and_utc());
    }

    #[test]
    fn test_mock_clock_can_be_updated() {
        let clock = MockClock::new(noon());
        let later = noon().with_hour(18).unwrap();

        clock.set_time(later);
        assert_eq!(clock.now_local(), later);
    }

    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new(noon());
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(clock.now_local(), noon().with_hour(14).unwrap());
    }

    #[test]
    fn test_memory_document_store_set_and_get() {
        let store = MemoryDocumentStore::new();
        store
            .set("locations", "1", json!({"name": "Alderman Library"}))
            .unwrap();

        let doc = store.get("locations", "1").unwrap().unwrap();
        assert_eq!(doc.id, "1");
        assert_eq!(doc.data["name"], "Alderman Library");
        assert!(store.get("locations", "2").unwrap().is_none());
        assert!(store.get("other", "1").unwrap().is_none());
    }

    #[test]
    fn test_memory_document_store_add_generates_distinct_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.add("c", json!({"n": 1})).unwrap();
        let b = store.add("c", json!({"n": 2})).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.count("c"), 2);
        assert_eq!(store.list("c").unwrap().len(), 2);
        assert!(store.list("missing").unwrap().is_empty());
    }

    #[test]
    fn test_memory_key_value_store() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }
}
