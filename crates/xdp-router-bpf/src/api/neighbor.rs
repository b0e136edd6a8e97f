//! Neighbor table codec.

use crate::table::{Table, TableCodec};
use crate::types::{MacValue, NEIGHBORS_MAP};
use std::net::IpAddr;
use xdp_router_types::{decode_ipv4, encode_ipv4, MacAddress, ParseError};

/// Codec for `neigh_map`: IPv4 address to the neighbor's MAC.
#[derive(Debug)]
pub struct NeighborCodec;

impl TableCodec for NeighborCodec {
    const NAME: &'static str = NEIGHBORS_MAP;
    type Key = IpAddr;
    type Value = MacAddress;
    type RawKey = u32;
    type RawValue = MacValue;

    fn encode_key(key: &IpAddr) -> Result<u32, ParseError> {
        encode_ipv4(*key)
    }

    fn encode_value(value: &MacAddress) -> Result<MacValue, ParseError> {
        Ok(MacValue {
            mac: *value.as_bytes(),
        })
    }

    fn decode_key(raw: &u32) -> IpAddr {
        IpAddr::V4(decode_ipv4(*raw))
    }

    fn decode_value(raw: &MacValue) -> MacAddress {
        MacAddress::new(raw.mac)
    }
}

/// The neighbor table.
pub type NeighborTable = Table<NeighborCodec>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMap;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn test_neighbor_upsert() {
        let map = MemoryMap::new();
        let mut neighbors = NeighborTable::new(map.clone());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let mac: MacAddress = "c6:9f:fb:e6:cc:1f".parse().unwrap();

        neighbors.upsert(&ip, &mac).unwrap();

        assert_eq!(
            map.lookup(&0x0A00_0002),
            Some(MacValue {
                mac: [0xc6, 0x9f, 0xfb, 0xe6, 0xcc, 0x1f]
            })
        );
        assert_eq!(neighbors.get(&ip).unwrap(), Some(mac));
    }

    #[test]
    fn test_neighbor_rejects_ipv6() {
        let mut neighbors = NeighborTable::new(MemoryMap::new());
        let ip: IpAddr = "fe80::1".parse().unwrap();
        assert!(neighbors.upsert(&ip, &MacAddress::ZERO).is_err());
    }
}
