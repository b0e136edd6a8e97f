//! Wire layouts shared with the data plane.
//!
//! Every struct here is `#[repr(C)]` and mirrors a key or value the XDP
//! program declares. Field order and widths must not change independently
//! of the program object.

use aya::Pod;

/// Section name of the XDP entry point inside the program object.
pub const PROGRAM_NAME: &str = "router";

/// LPM trie of IPv4 routes.
pub const ROUTES_MAP: &str = "routes_map";

/// Hash of ifindex to the interface's own MAC.
pub const INTERFACES_MAP: &str = "ifmap";

/// Hash of IPv4 address to neighbor MAC.
pub const NEIGHBORS_MAP: &str = "neigh_map";

/// Per-action counters.
pub const STATS_MAP: &str = "xdp_stats_map";

/// Route table key: prefix length followed by the host-order address.
///
/// Matches the layout of `aya::maps::lpm_trie::Key<u32>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LpmKey {
    pub prefix_len: u32,
    pub addr: u32,
}

impl LpmKey {
    pub const fn new(prefix_len: u32, addr: u32) -> Self {
        Self { prefix_len, addr }
    }
}

/// Route table value.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NextHop {
    pub ifindex: u32,
    pub gateway: u32,
}

/// Hardware address value used by the interface and neighbor tables.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacValue {
    pub mac: [u8; 6],
}

/// Counter record for one XDP action.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataRec {
    pub packets: u64,
    pub bytes: u64,
}

// SAFETY: all types are repr(C), contain only integers and byte arrays,
// and any bit pattern is a valid value.
unsafe impl Pod for LpmKey {}
unsafe impl Pod for NextHop {}
unsafe impl Pod for MacValue {}
unsafe impl Pod for DataRec {}
