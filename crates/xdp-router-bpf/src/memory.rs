//! In-process map backend.
//!
//! [`MemoryMap`] stands in for a kernel map when no program is loaded:
//! offline configuration checks and tests. Clones share storage, so a
//! caller can hand one clone to a [`Table`](crate::Table) and keep another
//! to inspect what was written.

use crate::table::{MapBackend, MapFault};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, V>,
    capacity: Option<usize>,
}

/// A shared, in-memory map with optional capacity.
#[derive(Debug)]
pub struct MemoryMap<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
}

impl<K, V> Clone for MemoryMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, V> Default for MemoryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> MemoryMap<K, V> {
    /// Creates an unbounded map.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                capacity: None,
            })),
        }
    }

    /// Creates a map that rejects new keys once `capacity` entries exist.
    pub fn with_capacity(capacity: usize) -> Self {
        let map = Self::new();
        map.inner.lock().capacity = Some(capacity);
        map
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> MemoryMap<K, V> {
    /// Returns a copy of the stored value, if any.
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Writes an entry directly, bypassing capacity.
    ///
    /// Used to seed values that the data plane itself would write, such as
    /// counters.
    pub fn seed(&self, key: K, value: V) {
        self.inner.lock().entries.insert(key, value);
    }
}

impl<K, V> MapBackend<K, V> for MemoryMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V) -> Result<(), MapFault> {
        let mut inner = self.inner.lock();
        if let Some(capacity) = inner.capacity {
            if !inner.entries.contains_key(&key) && inner.entries.len() >= capacity {
                return Err(MapFault::Full);
            }
        }
        inner.entries.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>, MapFault> {
        Ok(self.lookup(key))
    }

    fn entries(&self) -> Result<Vec<(K, V)>, MapFault> {
        let inner = self.inner.lock();
        Ok(inner
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clones_share_storage() {
        let map: MemoryMap<u32, u32> = MemoryMap::new();
        let mut writer = map.clone();

        writer.insert(1, 100).unwrap();
        assert_eq!(map.lookup(&1), Some(100));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_capacity_allows_overwrite() {
        let mut map: MemoryMap<u32, u32> = MemoryMap::with_capacity(1);

        map.insert(1, 100).unwrap();
        map.insert(1, 200).unwrap();
        assert_eq!(map.insert(2, 300), Err(MapFault::Full));
        assert_eq!(map.lookup(&1), Some(200));
    }

    #[test]
    fn test_seed_bypasses_capacity() {
        let map: MemoryMap<u32, u32> = MemoryMap::with_capacity(0);
        map.seed(2, 7);
        assert_eq!(map.get(&2).unwrap(), Some(7));
    }
}
