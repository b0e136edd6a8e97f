//! In-memory data plane.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use xdp_router_bpf::types::{DataRec, LpmKey, MacValue, NextHop};
use xdp_router_bpf::{
    Attacher, BpfError, BpfResult, InterfaceRef, InterfaceTable, LoadedProgram, MapBackend,
    MapFault, MemoryMap, NeighborTable, ProgramImage, ProgramLoader, RouteTable, StatsReader,
    XdpAction,
};

/// Something the fake attacher was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachEvent {
    Attached(String),
    Detached(String),
    /// The attacher, and with it the program, was dropped
    ProgramReleased,
}

/// Attacher that records every call and fails for chosen interfaces.
pub struct FakeAttacher {
    events: Arc<Mutex<Vec<AttachEvent>>>,
    failing: HashSet<String>,
}

impl Attacher for FakeAttacher {
    fn attach(&mut self, iface: &InterfaceRef) -> BpfResult<()> {
        if self.failing.contains(&iface.name) {
            return Err(BpfError::attach(&iface.name, "device refused XDP program"));
        }
        self.events
            .lock()
            .push(AttachEvent::Attached(iface.name.clone()));
        Ok(())
    }

    fn detach(&mut self, iface: &InterfaceRef) -> BpfResult<()> {
        self.events
            .lock()
            .push(AttachEvent::Detached(iface.name.clone()));
        Ok(())
    }
}

impl Drop for FakeAttacher {
    fn drop(&mut self) {
        self.events.lock().push(AttachEvent::ProgramReleased);
    }
}

/// Map that accepts writes and lookups but cannot be listed.
struct Unlistable<K, V>(MemoryMap<K, V>);

impl<K, V> MapBackend<K, V> for Unlistable<K, V>
where
    MemoryMap<K, V>: MapBackend<K, V>,
{
    fn insert(&mut self, key: K, value: V) -> Result<(), MapFault> {
        self.0.insert(key, value)
    }

    fn get(&self, key: &K) -> Result<Option<V>, MapFault> {
        self.0.get(key)
    }

    fn entries(&self) -> Result<Vec<(K, V)>, MapFault> {
        Err(MapFault::Syscall("map iteration not supported".to_string()))
    }
}

/// Loader whose tables live in shared memory the test can inspect.
///
/// Every handle returned by [`FakeDataPlane::load`] writes into the same
/// maps, so the test keeps the `FakeDataPlane` and reads back what the
/// daemon programmed.
#[derive(Clone, Default)]
pub struct FakeDataPlane {
    pub routes: MemoryMap<LpmKey, NextHop>,
    pub interfaces: MemoryMap<u32, MacValue>,
    pub neighbors: MemoryMap<u32, MacValue>,
    pub stats: MemoryMap<u32, DataRec>,
    events: Arc<Mutex<Vec<AttachEvent>>>,
    failing: HashSet<String>,
    load_error: Option<String>,
    unlistable_routes: bool,
}

impl FakeDataPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes attaching to `name` fail.
    pub fn fail_attach(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Makes every load fail with `message`.
    pub fn fail_load(mut self, message: impl Into<String>) -> Self {
        self.load_error = Some(message.into());
        self
    }

    /// Makes listing the route table fail; writes still land.
    pub fn fail_route_listing(mut self) -> Self {
        self.unlistable_routes = true;
        self
    }

    /// Bounds the route table at `capacity` entries.
    pub fn with_route_capacity(mut self, capacity: usize) -> Self {
        self.routes = MemoryMap::with_capacity(capacity);
        self
    }

    /// Bounds the neighbor table at `capacity` entries.
    pub fn with_neighbor_capacity(mut self, capacity: usize) -> Self {
        self.neighbors = MemoryMap::with_capacity(capacity);
        self
    }

    /// Sets the counters the program would have accumulated for `action`.
    pub fn seed_counter(&self, action: XdpAction, packets: u64, bytes: u64) {
        self.stats
            .seed(action.index(), DataRec { packets, bytes });
    }

    /// Every attacher call so far, in order.
    pub fn events(&self) -> Vec<AttachEvent> {
        self.events.lock().clone()
    }

    /// Interfaces attached and not yet detached, in attach order.
    pub fn attached(&self) -> Vec<String> {
        let mut attached: Vec<String> = Vec::new();
        for event in self.events.lock().iter() {
            match event {
                AttachEvent::Attached(name) => attached.push(name.clone()),
                AttachEvent::Detached(name) => attached.retain(|n| n != name),
                AttachEvent::ProgramReleased => {}
            }
        }
        attached
    }

    /// True once the program handed to the daemon has been dropped.
    pub fn program_released(&self) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| *e == AttachEvent::ProgramReleased)
    }
}

impl ProgramLoader for FakeDataPlane {
    fn load(&self, image: &ProgramImage) -> BpfResult<LoadedProgram> {
        if let Some(message) = &self.load_error {
            return Err(BpfError::load(message.clone()));
        }
        debug!(source = %image.source().display(), "Fake program loaded");

        let routes = if self.unlistable_routes {
            RouteTable::new(Unlistable(self.routes.clone()))
        } else {
            RouteTable::new(self.routes.clone())
        };

        Ok(LoadedProgram {
            routes,
            interfaces: InterfaceTable::new(self.interfaces.clone()),
            neighbors: NeighborTable::new(self.neighbors.clone()),
            stats: StatsReader::new(self.stats.clone()),
            attacher: Box::new(FakeAttacher {
                events: Arc::clone(&self.events),
                failing: self.failing.clone(),
            }),
        })
    }
}
