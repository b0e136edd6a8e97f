//! Neighbor orchestration logic.

use crate::config::NeighborConfig;
use crate::error::{Result, RouterdError};
use crate::orch::OrchStats;
use tracing::{error, info};
use xdp_router_bpf::types::NEIGHBORS_MAP;
use xdp_router_bpf::{BpfError, NeighborTable};
use xdp_router_types::{encode_mac, parse_ip_addr, MacAddress};

#[derive(Debug, Default)]
pub struct NeighOrch {
    stats: OrchStats,
}

impl NeighOrch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every configured neighbor, stopping at the first failure.
    pub fn apply(&mut self, table: &mut NeighborTable, neighbors: &[NeighborConfig]) -> Result<()> {
        for neighbor in neighbors {
            if let Err(e) = Self::apply_neighbor(table, neighbor) {
                self.stats.record_failed();
                let err = RouterdError::table_write(neighbor.to_string(), e);
                error!(error = %err, "Neighbor programming aborted");
                return Err(err);
            }
            self.stats.record_applied();
        }

        info!(count = neighbors.len(), "Neighbors applied");
        Ok(())
    }

    fn apply_neighbor(
        table: &mut NeighborTable,
        neighbor: &NeighborConfig,
    ) -> std::result::Result<(), BpfError> {
        let ip = parse_ip_addr(&neighbor.ip).map_err(|e| BpfError::encode(NEIGHBORS_MAP, e))?;
        let mac = encode_mac(&neighbor.mac)
            .map(MacAddress::from)
            .map_err(|e| BpfError::encode(NEIGHBORS_MAP, e))?;

        table.upsert(&ip, &mac)?;
        info!(ip = %ip, mac = %mac, "Neighbor applied");
        Ok(())
    }

    pub fn stats(&self) -> OrchStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::{IpAddr, Ipv4Addr};
    use xdp_router_bpf::MemoryMap;
    use xdp_router_types::ParseError;

    fn neighbor(ip: &str, mac: &str) -> NeighborConfig {
        NeighborConfig {
            ip: ip.to_string(),
            mac: mac.to_string(),
        }
    }

    #[test]
    fn test_apply_neighbors() {
        let mut table = NeighborTable::new(MemoryMap::new());
        let mut orch = NeighOrch::new();

        orch.apply(&mut table, &[neighbor("10.0.0.2", "c6:9f:fb:e6:cc:1f")])
            .unwrap();

        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(
            table.get(&ip).unwrap().map(|m| m.to_string()),
            Some("c6:9f:fb:e6:cc:1f".to_string())
        );
    }

    #[test]
    fn test_bad_mac_stops_pass() {
        let mut table = NeighborTable::new(MemoryMap::new());
        let mut orch = NeighOrch::new();

        let err = orch
            .apply(
                &mut table,
                &[
                    neighbor("10.0.0.2", "c6:9f:fb:e6:cc:1f"),
                    neighbor("10.0.0.3", "not-a-mac"),
                    neighbor("10.0.0.4", "c6:9f:fb:e6:cc:20"),
                ],
            )
            .unwrap_err();

        match err {
            RouterdError::TableWrite { entity, source } => {
                assert_eq!(entity, "neighbor 10.0.0.3 lladdr not-a-mac");
                assert!(matches!(
                    source,
                    BpfError::Encode {
                        source: ParseError::InvalidMacFormat(_),
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(orch.stats(), OrchStats { applied: 1, failed: 1 });
        assert_eq!(table.list().unwrap().len(), 1);
    }

    #[test]
    fn test_ipv6_neighbor_rejected() {
        let mut table = NeighborTable::new(MemoryMap::new());
        let err = NeighOrch::new()
            .apply(&mut table, &[neighbor("fe80::1", "c6:9f:fb:e6:cc:1f")])
            .unwrap_err();
        assert!(err.to_string().contains("fe80::1"));
    }
}
