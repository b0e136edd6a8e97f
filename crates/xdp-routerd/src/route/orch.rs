//! Route orchestration logic.

use super::types::RouteRequest;
use crate::config::RouteConfig;
use crate::error::{Result, RouterdError};
use crate::orch::OrchStats;
use crate::resolver::InterfaceResolver;
use tracing::{error, info};
use xdp_router_bpf::RouteTable;

#[derive(Debug, Default)]
pub struct RouteOrch {
    stats: OrchStats,
}

impl RouteOrch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every configured route, stopping at the first failure.
    pub fn apply(
        &mut self,
        table: &mut RouteTable,
        routes: &[RouteConfig],
        resolver: &dyn InterfaceResolver,
    ) -> Result<()> {
        for route in routes {
            if let Err(e) = self.apply_route(table, route, resolver) {
                self.stats.record_failed();
                error!(error = %e, "Route programming aborted");
                return Err(e);
            }
            self.stats.record_applied();
        }

        info!(count = routes.len(), "Routes applied");
        Ok(())
    }

    fn apply_route(
        &self,
        table: &mut RouteTable,
        route: &RouteConfig,
        resolver: &dyn InterfaceResolver,
    ) -> Result<()> {
        let request = RouteRequest::from_config(route, resolver)?;
        table
            .upsert(&request.key, &request.value)
            .map_err(|e| RouterdError::table_write(&request.entity, e))?;

        info!(
            route = %request.key,
            ifindex = request.value.ifindex,
            gateway = %request.value.gateway,
            "Route applied"
        );
        Ok(())
    }

    pub fn stats(&self) -> OrchStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolveError, ResolvedInterface};
    use nix::errno::Errno;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;
    use xdp_router_bpf::{MemoryMap, RouteKey, RouteValue};
    use xdp_router_types::MacAddress;

    struct OneInterface;

    impl InterfaceResolver for OneInterface {
        fn resolve(&self, name: &str) -> std::result::Result<ResolvedInterface, ResolveError> {
            if name == "eth0" {
                Ok(ResolvedInterface::new("eth0", 2, MacAddress::ZERO))
            } else {
                Err(ResolveError::NotFound {
                    name: name.to_string(),
                    source: Errno::ENODEV,
                })
            }
        }
    }

    fn route(destination: &str, prefixlen: u32, interface: &str) -> RouteConfig {
        RouteConfig {
            destination: destination.to_string(),
            prefixlen,
            interface: interface.to_string(),
            gateway: "0.0.0.0".to_string(),
        }
    }

    #[test]
    fn test_apply_routes() {
        let mut table = RouteTable::new(MemoryMap::new());
        let mut orch = RouteOrch::new();

        orch.apply(
            &mut table,
            &[route("10.1.0.0", 24, "eth0"), route("10.1.0.7", 32, "eth0")],
            &OneInterface,
        )
        .unwrap();

        assert_eq!(orch.stats().applied, 2);
        assert_eq!(
            table
                .get(&RouteKey::new(Ipv4Addr::new(10, 1, 0, 0), 24))
                .unwrap(),
            Some(RouteValue::direct(2))
        );
    }

    #[test]
    fn test_fail_fast_keeps_earlier_routes() {
        let mut table = RouteTable::new(MemoryMap::new());
        let mut orch = RouteOrch::new();

        let err = orch
            .apply(
                &mut table,
                &[
                    route("10.1.0.0", 24, "eth0"),
                    route("2001:db8::", 32, "eth0"),
                    route("10.2.0.0", 24, "eth0"),
                ],
                &OneInterface,
            )
            .unwrap_err();

        assert!(err.to_string().contains("route 2001:db8::/32"));
        assert_eq!(orch.stats(), OrchStats { applied: 1, failed: 1 });
        assert_eq!(table.list().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_egress_interface() {
        let mut table = RouteTable::new(MemoryMap::new());
        let err = RouteOrch::new()
            .apply(&mut table, &[route("10.1.0.0", 24, "eth9")], &OneInterface)
            .unwrap_err();
        assert!(matches!(err, RouterdError::Resolve { .. }));
    }

    #[test]
    fn test_malformed_destination() {
        let mut table = RouteTable::new(MemoryMap::new());
        let err = RouteOrch::new()
            .apply(&mut table, &[route("10.1.0", 24, "eth0")], &OneInterface)
            .unwrap_err();
        assert!(matches!(err, RouterdError::TableWrite { .. }));
    }
}
