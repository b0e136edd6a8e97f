//! Offline configuration check.
//!
//! Runs the same encode-and-write pass as the daemon against in-memory
//! tables, so a configuration can be vetted without loading a program or
//! touching any interface's XDP hook.

use crate::config::RouterConfig;
use crate::error::{Result, RouterdError};
use crate::intfs::IntfsOrch;
use crate::neigh::NeighOrch;
use crate::resolver::InterfaceResolver;
use crate::route::RouteOrch;
use std::fmt;
use tracing::info;
use xdp_router_bpf::{BpfError, InterfaceTable, MemoryMap, NeighborTable, RouteTable};

/// Entry counts produced by a successful check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub interfaces: usize,
    pub routes: usize,
    pub neighbors: usize,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} interfaces, {} routes, {} neighbors",
            self.interfaces, self.routes, self.neighbors
        )
    }
}

/// Validates `config` and encodes every entry, stopping at the first
/// failure.
pub fn check_config(config: &RouterConfig, resolver: &dyn InterfaceResolver) -> Result<CheckReport> {
    config.validate()?;

    let interfaces = config
        .interfaces
        .iter()
        .map(|name| {
            resolver.resolve(name).map_err(|source| RouterdError::Resolve {
                entity: format!("interface {name}"),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut routes = RouteTable::new(MemoryMap::new());
    let mut ifmap = InterfaceTable::new(MemoryMap::new());
    let mut neighbors = NeighborTable::new(MemoryMap::new());

    RouteOrch::new().apply(&mut routes, &config.routes, resolver)?;
    IntfsOrch::new().apply(&mut ifmap, &interfaces)?;
    NeighOrch::new().apply(&mut neighbors, &config.neighbors)?;

    let read = |e: BpfError| RouterdError::table_read("check tables", e);
    let report = CheckReport {
        interfaces: ifmap.list().map_err(read)?.len(),
        routes: routes.list().map_err(read)?.len(),
        neighbors: neighbors.list().map_err(read)?.len(),
    };
    info!(%report, "Configuration check passed");
    Ok(report)
}
