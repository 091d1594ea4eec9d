//! Favorite buildings, kept on the device as a JSON array of names.

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::traits::KeyValueStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    names: BTreeSet<String>,
}

impl Favorites {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the stored set. A missing key is an empty set.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Self> {
        let Some(raw) = store.get(key).context("Failed to read favorites")? else {
            return Ok(Self::default());
        };
        let names: Vec<String> =
            serde_json::from_str(&raw).context("Stored favorites are not a JSON list of names")?;
        Ok(Self::from_names(names))
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S, key: &str) -> Result<()> {
        let raw = serde_json::to_string(&self.names).context("Failed to serialize favorites")?;
        store.set(key, &raw).context("Failed to save favorites")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Flip membership and persist. Returns whether the name is now a favorite.
    ///
    /// The set is left unchanged if the store write fails.
    pub fn toggle<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
        name: &str,
    ) -> Result<bool> {
        let mut next = self.clone();
        let added = if next.names.remove(name) {
            false
        } else {
            next.names.insert(name.to_string());
            true
        };
        next.save(store, key)?;
        *self = next;
        tracing::debug!(name, added, "Toggled favorite");
        Ok(added)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MemoryKeyValueStore;

    const KEY: &str = "UVA_FAVORITE_BUILDINGS";

    #[test]
    fn test_load_missing_key_is_empty() {
        let store = MemoryKeyValueStore::new();
        let favorites = Favorites::load(&store, KEY).unwrap();
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_load_existing_list() {
        let store = MemoryKeyValueStore::new();
        store
            .set(KEY, r#"["Alderman Library","Newcomb Dining Hall"]"#)
            .unwrap();

        let favorites = Favorites::load(&store, KEY).unwrap();
        assert_eq!(favorites.len(), 2);
        assert!(favorites.contains("Alderman Library"));
        assert!(!favorites.contains("Rice Hall"));
    }

    #[test]
    fn test_load_corrupt_value_is_error() {
        let store = MemoryKeyValueStore::new();
        store.set(KEY, "{not json").unwrap();
        assert!(Favorites::load(&store, KEY).is_err());
    }

    #[test]
    fn test_toggle_adds_then_removes_and_persists() {
        let store = MemoryKeyValueStore::new();
        let mut favorites = Favorites::default();

        assert!(favorites.toggle(&store, KEY, "Rice Hall").unwrap());
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some(r#"["Rice Hall"]"#));
        assert!(Favorites::load(&store, KEY).unwrap().contains("Rice Hall"));

        assert!(!favorites.toggle(&store, KEY, "Rice Hall").unwrap());
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("[]"));
        assert!(favorites.is_empty());
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("device storage is read-only")
        }
    }

    #[test]
    fn test_toggle_failed_save_leaves_set_unchanged() {
        let mut favorites = Favorites::default();
        assert!(favorites.toggle(&ReadOnlyStore, KEY, "Rice Hall").is_err());
        assert!(!favorites.contains("Rice Hall"));

        let mut favorites = Favorites::from_names(["Rice Hall"]);
        assert!(favorites.toggle(&ReadOnlyStore, KEY, "Rice Hall").is_err());
        assert!(favorites.contains("Rice Hall"));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_iter_is_sorted() {
        let favorites = Favorites::from_names(["b", "a", "c"]);
        let names: Vec<_> = favorites.iter().collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
