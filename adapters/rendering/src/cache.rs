use std::{
    collections::{hash_map::Entry, HashMap},
    hash::Hash,
};

use anyhow::Result;

/// Keyed store of loaded resources that populates each entry on first use.
///
/// Failed loads leave no entry behind, so the next lookup tries again.
#[derive(Debug)]
pub struct ResourceCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> ResourceCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resource stored under `key`, if it was loaded before.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns the resource stored under `key`, running `load` only when the
    /// cache has no entry for it yet.
    pub fn get_or_try_insert_with<F>(&mut self, key: K, load: F) -> Result<&V>
    where
        F: FnOnce() -> Result<V>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let value = load()?;
                Ok(entry.insert(value))
            }
        }
    }

    /// Number of loaded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
