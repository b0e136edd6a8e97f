//! Map backends over kernel BPF maps.

use crate::table::{MapBackend, MapFault};
use crate::types::LpmKey;
use aya::maps::lpm_trie::{Key, LpmTrie};
use aya::maps::{Array, HashMap, MapData, MapError};
use aya::Pod;

fn fault(err: MapError) -> MapFault {
    MapFault::Syscall(err.to_string())
}

/// Backend over a `BPF_MAP_TYPE_HASH` map.
pub struct HashMapBackend<K: Pod, V: Pod> {
    map: HashMap<MapData, K, V>,
}

impl<K: Pod, V: Pod> HashMapBackend<K, V> {
    pub fn new(map: HashMap<MapData, K, V>) -> Self {
        Self { map }
    }
}

impl<K, V> MapBackend<K, V> for HashMapBackend<K, V>
where
    K: Pod,
    V: Pod,
{
    fn insert(&mut self, key: K, value: V) -> Result<(), MapFault> {
        self.map.insert(key, value, 0).map_err(fault)
    }

    fn get(&self, key: &K) -> Result<Option<V>, MapFault> {
        match self.map.get(key, 0) {
            Ok(value) => Ok(Some(value)),
            Err(MapError::KeyNotFound) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }

    fn entries(&self) -> Result<Vec<(K, V)>, MapFault> {
        self.map.iter().map(|entry| entry.map_err(fault)).collect()
    }
}

/// Backend over a `BPF_MAP_TYPE_LPM_TRIE` map of IPv4 routes.
pub struct LpmTrieBackend<V: Pod> {
    trie: LpmTrie<MapData, u32, V>,
}

impl<V: Pod> LpmTrieBackend<V> {
    pub fn new(trie: LpmTrie<MapData, u32, V>) -> Self {
        Self { trie }
    }
}

impl<V: Pod> MapBackend<LpmKey, V> for LpmTrieBackend<V> {
    fn insert(&mut self, key: LpmKey, value: V) -> Result<(), MapFault> {
        self.trie
            .insert(&Key::new(key.prefix_len, key.addr), value, 0)
            .map_err(fault)
    }

    // A kernel lookup on an LPM trie returns the best match, not the exact
    // key, so exact lookups scan the entries.
    fn get(&self, key: &LpmKey) -> Result<Option<V>, MapFault> {
        for entry in self.trie.iter() {
            let (k, v) = entry.map_err(fault)?;
            if k.prefix_len() == key.prefix_len && k.data() == key.addr {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn entries(&self) -> Result<Vec<(LpmKey, V)>, MapFault> {
        self.trie
            .iter()
            .map(|entry| {
                entry
                    .map(|(k, v)| (LpmKey::new(k.prefix_len(), k.data()), v))
                    .map_err(fault)
            })
            .collect()
    }
}

/// Backend over a `BPF_MAP_TYPE_ARRAY` map indexed by `u32`.
pub struct ArrayBackend<V: Pod> {
    array: Array<MapData, V>,
}

impl<V: Pod> ArrayBackend<V> {
    pub fn new(array: Array<MapData, V>) -> Self {
        Self { array }
    }
}

impl<V: Pod> MapBackend<u32, V> for ArrayBackend<V> {
    fn insert(&mut self, key: u32, value: V) -> Result<(), MapFault> {
        self.array.set(key, value, 0).map_err(fault)
    }

    fn get(&self, key: &u32) -> Result<Option<V>, MapFault> {
        match self.array.get(key, 0) {
            Ok(value) => Ok(Some(value)),
            Err(MapError::OutOfBounds { .. }) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }

    fn entries(&self) -> Result<Vec<(u32, V)>, MapFault> {
        (0..self.array.len())
            .map(|index| self.array.get(&index, 0).map(|v| (index, v)).map_err(fault))
            .collect()
    }
}
