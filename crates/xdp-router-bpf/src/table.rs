//! Generic table abstraction over the data-plane maps.
//!
//! The route, neighbor and interface tables share one shape: a host-side
//! key and value are encoded into fixed-width raw forms and written to a
//! map backend with upsert semantics. [`TableCodec`] describes the
//! encoding for one table and [`Table`] applies it.

use crate::error::{BpfError, BpfResult};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use xdp_router_types::ParseError;

/// Failure reported by a map backend.
///
/// Backends do not know which table they serve; [`Table`] attaches the
/// table name when converting into [`BpfError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapFault {
    #[error("no space left in map")]
    Full,

    #[error("{0}")]
    Syscall(String),
}

/// Raw key/value storage for one data-plane map.
///
/// `insert` overwrites an existing key. A single insert is atomic with
/// respect to readers; nothing larger is.
pub trait MapBackend<K, V> {
    /// Inserts or overwrites an entry.
    fn insert(&mut self, key: K, value: V) -> Result<(), MapFault>;

    /// Looks up an entry; a missing key is `Ok(None)`.
    fn get(&self, key: &K) -> Result<Option<V>, MapFault>;

    /// Returns a snapshot of every entry, in no particular order.
    fn entries(&self) -> Result<Vec<(K, V)>, MapFault>;
}

/// Encoding rules for one table.
pub trait TableCodec {
    /// Map name inside the program object.
    const NAME: &'static str;

    /// Host-side key.
    type Key: fmt::Display;
    /// Host-side value.
    type Value;
    /// Key as stored in the map.
    type RawKey: Copy;
    /// Value as stored in the map.
    type RawValue: Copy;

    fn encode_key(key: &Self::Key) -> Result<Self::RawKey, ParseError>;
    fn encode_value(value: &Self::Value) -> Result<Self::RawValue, ParseError>;
    fn decode_key(raw: &Self::RawKey) -> Self::Key;
    fn decode_value(raw: &Self::RawValue) -> Self::Value;
}

/// A data-plane table with host-side types.
pub struct Table<C: TableCodec> {
    backend: Box<dyn MapBackend<C::RawKey, C::RawValue>>,
}

impl<C: TableCodec> Table<C> {
    /// Creates a table over a backend.
    pub fn new(backend: impl MapBackend<C::RawKey, C::RawValue> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Returns the map name of this table.
    pub fn name(&self) -> &'static str {
        C::NAME
    }

    /// Inserts or overwrites an entry.
    ///
    /// Both key and value are encoded before anything is written, so an
    /// encoding failure leaves the table untouched. The entry is visible to
    /// the data plane when this returns `Ok`.
    pub fn upsert(&mut self, key: &C::Key, value: &C::Value) -> BpfResult<()> {
        let raw_key = C::encode_key(key).map_err(|e| BpfError::encode(C::NAME, e))?;
        let raw_value = C::encode_value(value).map_err(|e| BpfError::encode(C::NAME, e))?;

        self.backend
            .insert(raw_key, raw_value)
            .map_err(|f| BpfError::write_fault(C::NAME, f))?;

        debug!(table = C::NAME, key = %key, "Upserted entry");
        Ok(())
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &C::Key) -> BpfResult<Option<C::Value>> {
        let raw_key = C::encode_key(key).map_err(|e| BpfError::encode(C::NAME, e))?;
        let raw = self
            .backend
            .get(&raw_key)
            .map_err(|f| BpfError::read_fault(C::NAME, f))?;
        Ok(raw.as_ref().map(C::decode_value))
    }

    /// Returns every entry currently in the table, in no particular order.
    pub fn list(&self) -> BpfResult<Vec<(C::Key, C::Value)>> {
        let entries = self
            .backend
            .entries()
            .map_err(|f| BpfError::read_fault(C::NAME, f))?;

        Ok(entries
            .iter()
            .map(|(k, v)| (C::decode_key(k), C::decode_value(v)))
            .collect())
    }
}

impl<C: TableCodec> fmt::Debug for Table<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &C::NAME).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMap;
    use pretty_assertions::assert_eq;

    struct PortCodec;

    impl TableCodec for PortCodec {
        const NAME: &'static str = "ports";
        type Key = String;
        type Value = u16;
        type RawKey = u32;
        type RawValue = u16;

        fn encode_key(key: &String) -> Result<u32, ParseError> {
            key.parse()
                .map_err(|_| ParseError::InvalidIpAddress(key.clone()))
        }

        fn encode_value(value: &u16) -> Result<u16, ParseError> {
            Ok(*value)
        }

        fn decode_key(raw: &u32) -> String {
            raw.to_string()
        }

        fn decode_value(raw: &u16) -> u16 {
            *raw
        }
    }

    #[test]
    fn test_upsert_overwrites() {
        let map = MemoryMap::new();
        let mut table = Table::<PortCodec>::new(map.clone());

        table.upsert(&"7".to_string(), &80).unwrap();
        table.upsert(&"7".to_string(), &443).unwrap();

        assert_eq!(table.get(&"7".to_string()).unwrap(), Some(443));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_encode_failure_writes_nothing() {
        let map = MemoryMap::new();
        let mut table = Table::<PortCodec>::new(map.clone());

        let err = table.upsert(&"seven".to_string(), &80).unwrap_err();
        assert!(matches!(err, BpfError::Encode { table: "ports", .. }));
        assert!(map.is_empty());
    }

    #[test]
    fn test_full_backend() {
        let map = MemoryMap::with_capacity(1);
        let mut table = Table::<PortCodec>::new(map);

        table.upsert(&"1".to_string(), &1).unwrap();
        let err = table.upsert(&"2".to_string(), &2).unwrap_err();
        assert!(matches!(err, BpfError::TableFull { table: "ports" }));
    }

    #[test]
    fn test_missing_key_is_none() {
        let table = Table::<PortCodec>::new(MemoryMap::new());
        assert_eq!(table.get(&"9".to_string()).unwrap(), None);
    }

    #[test]
    fn test_list_decodes() {
        let mut table = Table::<PortCodec>::new(MemoryMap::new());
        table.upsert(&"1".to_string(), &10).unwrap();
        table.upsert(&"2".to_string(), &20).unwrap();

        let mut entries = table.list().unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![("1".to_string(), 10), ("2".to_string(), 20)]
        );
    }
}
