//! RouterDaemon implementation.

use super::state::LifecycleState;
use crate::config::RouterConfig;
use crate::error::{Result, RouterdError};
use crate::intfs::IntfsOrch;
use crate::neigh::NeighOrch;
use crate::resolver::{InterfaceResolver, ResolvedInterface};
use crate::route::RouteOrch;
use std::future::Future;
use tokio::signal;
use tokio::signal::unix::SignalKind;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use xdp_router_bpf::{
    AttachmentHandle, AttachmentManager, BpfError, Counters, InterfaceTable, NeighborTable,
    ProgramImage, ProgramLoader, RouteKey, RouteTable, RouteValue, StatsReader, XdpAction,
};

/// Tables and counters of the loaded program.
struct DataPlane {
    routes: RouteTable,
    interfaces: InterfaceTable,
    neighbors: NeighborTable,
    stats: StatsReader,
}

/// What one polling pass observed.
///
/// A `None` marks an item whose read failed; the failure has been logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub counters: Vec<(XdpAction, Option<Counters>)>,
    pub routes: Option<Vec<(RouteKey, RouteValue)>>,
}

/// The control-plane daemon.
///
/// Owns the attachments, the loaded program and its tables. Dropping the
/// daemon runs the same release sequence as [`RouterDaemon::shutdown`].
pub struct RouterDaemon {
    config: RouterConfig,
    resolver: Box<dyn InterfaceResolver>,
    state: LifecycleState,
    // Released before `attachments` is dropped, in reverse order.
    handles: Vec<AttachmentHandle>,
    attachments: Option<AttachmentManager>,
    dataplane: Option<DataPlane>,
    interfaces: Vec<ResolvedInterface>,
    route_orch: RouteOrch,
    intfs_orch: IntfsOrch,
    neigh_orch: NeighOrch,
}

impl RouterDaemon {
    pub fn new(config: RouterConfig, resolver: Box<dyn InterfaceResolver>) -> Self {
        Self {
            config,
            resolver,
            state: LifecycleState::Uninitialized,
            handles: Vec::new(),
            attachments: None,
            dataplane: None,
            interfaces: Vec::new(),
            route_orch: RouteOrch::new(),
            intfs_orch: IntfsOrch::new(),
            neigh_orch: NeighOrch::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Interfaces attached so far, in attach order.
    pub fn interfaces(&self) -> &[ResolvedInterface] {
        &self.interfaces
    }

    pub fn route_orch(&self) -> &RouteOrch {
        &self.route_orch
    }

    pub fn intfs_orch(&self) -> &IntfsOrch {
        &self.intfs_orch
    }

    pub fn neigh_orch(&self) -> &NeighOrch {
        &self.neigh_orch
    }

    fn transition(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
    }

    fn expect_state(&self, operation: &'static str, expected: LifecycleState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RouterdError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Loads the program. A failure is fatal and leaves the daemon
    /// `Terminated`.
    pub fn load(&mut self, loader: &dyn ProgramLoader, image: &ProgramImage) -> Result<()> {
        self.expect_state("load", LifecycleState::Uninitialized)?;

        let program = match loader.load(image) {
            Ok(program) => program,
            Err(e) => {
                error!(source = %image.source().display(), error = %e, "Program load failed");
                self.transition(LifecycleState::Terminated);
                return Err(RouterdError::Load(e));
            }
        };

        self.attachments = Some(AttachmentManager::new(program.attacher));
        self.dataplane = Some(DataPlane {
            routes: program.routes,
            interfaces: program.interfaces,
            neighbors: program.neighbors,
            stats: program.stats,
        });
        self.transition(LifecycleState::Loaded);
        Ok(())
    }

    /// Attaches to every configured interface in configuration order.
    ///
    /// The first failure releases the attachments already made and leaves
    /// the daemon `Terminated`.
    pub fn attach_all(&mut self) -> Result<()> {
        self.expect_state("attach", LifecycleState::Loaded)?;

        if let Err(e) = self.try_attach_all() {
            error!(error = %e, "Attach failed");
            self.shutdown();
            return Err(e);
        }

        self.transition(LifecycleState::Attached);
        Ok(())
    }

    fn try_attach_all(&mut self) -> Result<()> {
        let manager = self.attachments.as_mut().ok_or(RouterdError::InvalidState {
            operation: "attach",
            state: self.state,
        })?;

        for name in &self.config.interfaces {
            let iface = self
                .resolver
                .resolve(name)
                .map_err(|e| RouterdError::Attach {
                    interface: name.clone(),
                    source: BpfError::attach(name, e.to_string()),
                })?;
            let handle = manager
                .attach(&iface.to_ref())
                .map_err(|source| RouterdError::Attach {
                    interface: name.clone(),
                    source,
                })?;
            self.handles.push(handle);
            self.interfaces.push(iface);
        }
        Ok(())
    }

    /// Writes routes, then interface MACs, then neighbors.
    ///
    /// The first failure stops the pass, releases every attachment and
    /// leaves the daemon `Terminated`. Entries written before the failure
    /// are not rolled back.
    pub fn apply_config(&mut self) -> Result<()> {
        self.expect_state("apply configuration", LifecycleState::Attached)?;

        if let Err(e) = self.try_apply_config() {
            error!(error = %e, "Configuration apply failed");
            self.shutdown();
            return Err(e);
        }

        info!(
            routes = self.route_orch.stats().applied,
            interfaces = self.intfs_orch.stats().applied,
            neighbors = self.neigh_orch.stats().applied,
            "Configuration applied"
        );
        self.transition(LifecycleState::ConfigApplied);
        Ok(())
    }

    fn try_apply_config(&mut self) -> Result<()> {
        let dataplane = self.dataplane.as_mut().ok_or(RouterdError::InvalidState {
            operation: "apply configuration",
            state: self.state,
        })?;

        self.route_orch.apply(
            &mut dataplane.routes,
            &self.config.routes,
            self.resolver.as_ref(),
        )?;
        self.intfs_orch
            .apply(&mut dataplane.interfaces, &self.interfaces)?;
        self.neigh_orch
            .apply(&mut dataplane.neighbors, &self.config.neighbors)?;
        Ok(())
    }

    /// Load, attach and apply configuration.
    pub fn start(&mut self, loader: &dyn ProgramLoader, image: &ProgramImage) -> Result<()> {
        self.load(loader, image)?;
        self.attach_all()?;
        self.apply_config()
    }

    /// Reads every counter and the route table once, logging what it sees.
    ///
    /// Each item is read independently; a failed read is logged and the
    /// pass continues.
    pub fn poll_once(&self) -> PollReport {
        let Some(dataplane) = self.dataplane.as_ref() else {
            return PollReport::default();
        };

        let counters = dataplane
            .stats
            .snapshot()
            .into_iter()
            .map(|(action, result)| match result {
                Ok(c) => {
                    info!(action = %action, packets = c.packets, bytes = c.bytes, "Counters");
                    (action, Some(c))
                }
                Err(e) => {
                    let err = RouterdError::table_read(format!("counters for {action}"), e);
                    warn!(error = %err, "Counter read failed");
                    (action, None)
                }
            })
            .collect();

        let routes = match dataplane.routes.list() {
            Ok(routes) => {
                for (key, value) in &routes {
                    info!("Route: {key} {value}");
                }
                Some(routes)
            }
            Err(e) => {
                let err = RouterdError::table_read("route table", e);
                warn!(error = %err, "Route listing failed");
                None
            }
        };

        PollReport { counters, routes }
    }

    /// Polls on the configured interval until `shutdown` completes, then
    /// releases everything. Returns the number of polling passes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        self.expect_state("poll", LifecycleState::ConfigApplied)?;
        self.transition(LifecycleState::Polling);

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut polls = 0u64;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(polls, "Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once();
                    polls += 1;
                }
            }
        }

        self.shutdown();
        Ok(polls)
    }

    /// Releases attachments in reverse order, then the program.
    ///
    /// Safe to call from any state; a terminated daemon is left alone.
    pub fn shutdown(&mut self) {
        match self.state {
            LifecycleState::Terminated => return,
            LifecycleState::Uninitialized => {
                self.transition(LifecycleState::Terminated);
                return;
            }
            LifecycleState::ShuttingDown => {}
            _ => self.transition(LifecycleState::ShuttingDown),
        }

        if let Some(mut manager) = self.attachments.take() {
            while let Some(handle) = self.handles.pop() {
                let name = handle.interface().name.clone();
                if let Err(e) = manager.release(handle) {
                    warn!(interface = %name, error = %e, "Release failed");
                }
            }
            if let Err(e) = manager.release_all() {
                warn!(error = %e, "Release of remaining attachments failed");
            }
            drop(manager);
            debug!("Program released");
        }
        self.dataplane = None;

        self.transition(LifecycleState::Terminated);
    }
}

impl Drop for RouterDaemon {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Completes on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use xdp_router_bpf::types::DataRec;
    use xdp_router_bpf::{Attacher, BpfResult, InterfaceRef, LoadedProgram, MemoryMap};
    use xdp_router_types::MacAddress;

    struct NoopAttacher;

    impl Attacher for NoopAttacher {
        fn attach(&mut self, _iface: &InterfaceRef) -> BpfResult<()> {
            Ok(())
        }

        fn detach(&mut self, _iface: &InterfaceRef) -> BpfResult<()> {
            Ok(())
        }
    }

    struct MemoryLoader {
        stats: MemoryMap<u32, DataRec>,
        fail: bool,
    }

    impl ProgramLoader for MemoryLoader {
        fn load(&self, _image: &ProgramImage) -> BpfResult<LoadedProgram> {
            if self.fail {
                return Err(BpfError::load("verifier said no"));
            }
            Ok(LoadedProgram {
                routes: RouteTable::new(MemoryMap::new()),
                interfaces: InterfaceTable::new(MemoryMap::new()),
                neighbors: NeighborTable::new(MemoryMap::new()),
                stats: StatsReader::new(self.stats.clone()),
                attacher: Box::new(NoopAttacher),
            })
        }
    }

    struct AnyInterface;

    impl InterfaceResolver for AnyInterface {
        fn resolve(&self, name: &str) -> std::result::Result<ResolvedInterface, ResolveError> {
            Ok(ResolvedInterface::new(name, 7, MacAddress::ZERO))
        }
    }

    fn daemon() -> RouterDaemon {
        RouterDaemon::new(
            RouterConfig::new(vec!["eth0".to_string()]),
            Box::new(AnyInterface),
        )
    }

    fn loader(fail: bool) -> MemoryLoader {
        MemoryLoader {
            stats: MemoryMap::new(),
            fail,
        }
    }

    #[test]
    fn test_start_reaches_config_applied() {
        let mut daemon = daemon();
        daemon
            .start(&loader(false), &ProgramImage::from_bytes(Vec::new()))
            .unwrap();
        assert_eq!(daemon.state(), LifecycleState::ConfigApplied);
        assert_eq!(daemon.interfaces().len(), 1);
    }

    #[test]
    fn test_load_failure_terminates() {
        let mut daemon = daemon();
        let err = daemon
            .start(&loader(true), &ProgramImage::from_bytes(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, RouterdError::Load(_)));
        assert_eq!(daemon.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_out_of_order_call_rejected() {
        let mut daemon = daemon();
        let err = daemon.apply_config().unwrap_err();
        assert!(matches!(err, RouterdError::InvalidState { .. }));
        assert_eq!(daemon.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_poll_reports_zero_counters() {
        let mut daemon = daemon();
        let loader = loader(false);
        loader.stats.seed(
            XdpAction::Pass.index(),
            DataRec {
                packets: 1,
                bytes: 60,
            },
        );
        daemon
            .start(&loader, &ProgramImage::from_bytes(Vec::new()))
            .unwrap();

        let report = daemon.poll_once();
        assert_eq!(report.counters.len(), 5);
        assert_eq!(
            report.counters[XdpAction::Pass.index() as usize],
            (
                XdpAction::Pass,
                Some(Counters {
                    packets: 1,
                    bytes: 60
                })
            )
        );
        assert_eq!(
            report.counters[0],
            (XdpAction::Aborted, Some(Counters::default()))
        );
        assert_eq!(report.routes, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let mut daemon = daemon();
        daemon
            .start(&loader(false), &ProgramImage::from_bytes(Vec::new()))
            .unwrap();

        let polls = daemon
            .run_until(tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert!(polls >= 1);
        assert_eq!(daemon.state(), LifecycleState::Terminated);
    }
}
