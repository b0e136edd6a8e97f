//! Interface orchestration logic.

use crate::error::{Result, RouterdError};
use crate::orch::OrchStats;
use crate::resolver::ResolvedInterface;
use tracing::{error, info};
use xdp_router_bpf::InterfaceTable;

#[derive(Debug, Default)]
pub struct IntfsOrch {
    stats: OrchStats,
}

impl IntfsOrch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `ifindex -> mac` for every interface, stopping at the first
    /// failure.
    pub fn apply(
        &mut self,
        table: &mut InterfaceTable,
        interfaces: &[ResolvedInterface],
    ) -> Result<()> {
        for iface in interfaces {
            if let Err(e) = table.upsert(&iface.ifindex, &iface.mac) {
                self.stats.record_failed();
                let err = RouterdError::table_write(format!("interface {}", iface.name), e);
                error!(error = %err, "Interface programming aborted");
                return Err(err);
            }
            self.stats.record_applied();
            info!(
                interface = %iface.name,
                ifindex = iface.ifindex,
                mac = %iface.mac,
                "Interface applied"
            );
        }
        Ok(())
    }

    pub fn stats(&self) -> OrchStats {
        self.stats
    }
}
