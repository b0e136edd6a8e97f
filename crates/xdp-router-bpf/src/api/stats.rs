//! Per-action traffic counters.
//!
//! The data plane counts packets and bytes per terminal disposition in an
//! array indexed by the XDP action code. The control plane only reads and
//! displays these values.

use crate::error::{BpfError, BpfResult};
use crate::table::MapBackend;
use crate::types::{DataRec, STATS_MAP};
use std::fmt;

/// Terminal disposition of a packet in the data plane.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XdpAction {
    Aborted = 0,
    Drop = 1,
    Pass = 2,
    Tx = 3,
    Redirect = 4,
}

impl XdpAction {
    /// Every action, in index order.
    pub const ALL: [XdpAction; 5] = [
        XdpAction::Aborted,
        XdpAction::Drop,
        XdpAction::Pass,
        XdpAction::Tx,
        XdpAction::Redirect,
    ];

    /// Returns the counter index of this action.
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Returns the action for a counter index.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            XdpAction::Aborted => "XDP_ABORTED",
            XdpAction::Drop => "XDP_DROP",
            XdpAction::Pass => "XDP_PASS",
            XdpAction::Tx => "XDP_TX",
            XdpAction::Redirect => "XDP_REDIRECT",
        }
    }
}

impl fmt::Display for XdpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packet and byte counts for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub packets: u64,
    pub bytes: u64,
}

impl From<DataRec> for Counters {
    fn from(rec: DataRec) -> Self {
        Self {
            packets: rec.packets,
            bytes: rec.bytes,
        }
    }
}

/// Read-only access to the counter array.
pub struct StatsReader {
    backend: Box<dyn MapBackend<u32, DataRec>>,
}

impl StatsReader {
    pub fn new(backend: impl MapBackend<u32, DataRec> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Reads the counters for one action.
    ///
    /// An action with no recorded traffic reads as zero.
    pub fn read_counter(&self, action: XdpAction) -> BpfResult<Counters> {
        let rec = self
            .backend
            .get(&action.index())
            .map_err(|f| BpfError::read_fault(STATS_MAP, f))?;
        Ok(rec.map(Counters::from).unwrap_or_default())
    }

    /// Reads every action independently.
    ///
    /// A failure for one action is returned in its slot and does not
    /// prevent the others from being read.
    pub fn snapshot(&self) -> Vec<(XdpAction, BpfResult<Counters>)> {
        XdpAction::ALL
            .iter()
            .map(|&action| (action, self.read_counter(action)))
            .collect()
    }
}

impl fmt::Debug for StatsReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsReader").field("map", &STATS_MAP).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMap;
    use crate::table::MapFault;
    use pretty_assertions::assert_eq;

    /// Backend that fails for a single index.
    struct FlakyArray {
        inner: MemoryMap<u32, DataRec>,
        broken: u32,
    }

    impl MapBackend<u32, DataRec> for FlakyArray {
        fn insert(&mut self, key: u32, value: DataRec) -> Result<(), MapFault> {
            self.inner.insert(key, value)
        }

        fn get(&self, key: &u32) -> Result<Option<DataRec>, MapFault> {
            if *key == self.broken {
                return Err(MapFault::Syscall("EIO".to_string()));
            }
            self.inner.get(key)
        }

        fn entries(&self) -> Result<Vec<(u32, DataRec)>, MapFault> {
            self.inner.entries()
        }
    }

    #[test]
    fn test_action_indices() {
        assert_eq!(XdpAction::Pass.index(), 2);
        assert_eq!(XdpAction::from_index(4), Some(XdpAction::Redirect));
        assert_eq!(XdpAction::from_index(5), None);
        assert_eq!(XdpAction::Drop.to_string(), "XDP_DROP");
    }

    #[test]
    fn test_no_traffic_reads_zero() {
        let stats = StatsReader::new(MemoryMap::new());
        assert_eq!(
            stats.read_counter(XdpAction::Pass).unwrap(),
            Counters {
                packets: 0,
                bytes: 0
            }
        );
    }

    #[test]
    fn test_read_seeded_counter() {
        let map = MemoryMap::new();
        map.seed(
            XdpAction::Pass.index(),
            DataRec {
                packets: 3,
                bytes: 294,
            },
        );
        let stats = StatsReader::new(map);

        let counters = stats.read_counter(XdpAction::Pass).unwrap();
        assert_eq!(counters.packets, 3);
        assert_eq!(counters.bytes, 294);
    }

    #[test]
    fn test_snapshot_isolates_failures() {
        let stats = StatsReader::new(FlakyArray {
            inner: MemoryMap::new(),
            broken: XdpAction::Drop.index(),
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), 5);
        for (action, result) in snapshot {
            if action == XdpAction::Drop {
                assert!(result.unwrap_err().is_lookup());
            } else {
                assert_eq!(result.unwrap(), Counters::default());
            }
        }
    }
}
