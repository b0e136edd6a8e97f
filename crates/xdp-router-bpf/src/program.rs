//! Loading the data-plane program.
//!
//! Loading yields every table and the counter reader as independent
//! objects, plus the [`Attacher`] that owns the program itself. The
//! attacher is handed to an [`AttachmentManager`](crate::AttachmentManager)
//! which keeps the program alive until every attachment is released.

use crate::api::{InterfaceTable, NeighborTable, RouteTable, StatsReader};
use crate::attach::{Attacher, XdpAttacher};
use crate::error::{BpfError, BpfResult};
use crate::kernel::{ArrayBackend, HashMapBackend, LpmTrieBackend};
use crate::types::{
    DataRec, MacValue, NextHop, INTERFACES_MAP, NEIGHBORS_MAP, PROGRAM_NAME, ROUTES_MAP, STATS_MAP,
};
use aya::maps::{Array, HashMap, LpmTrie, Map, MapData};
use aya::programs::{ProgramError, Xdp, XdpFlags};
use aya::Ebpf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// XDP attach mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XdpMode {
    /// Generic (SKB) mode, works on any interface.
    #[default]
    Generic,
    /// Native driver mode.
    Driver,
    /// Offloaded to the NIC.
    Hardware,
}

impl XdpMode {
    pub fn flags(self) -> XdpFlags {
        match self {
            XdpMode::Generic => XdpFlags::SKB_MODE,
            XdpMode::Driver => XdpFlags::DRV_MODE,
            XdpMode::Hardware => XdpFlags::HW_MODE,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            XdpMode::Generic => "generic",
            XdpMode::Driver => "driver",
            XdpMode::Hardware => "hardware",
        }
    }
}

impl fmt::Display for XdpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XdpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "skb" => Ok(XdpMode::Generic),
            "driver" | "native" => Ok(XdpMode::Driver),
            "hardware" | "hw" => Ok(XdpMode::Hardware),
            other => Err(format!("unknown XDP mode: {other}")),
        }
    }
}

/// Compiled data-plane object bytes.
#[derive(Clone)]
pub struct ProgramImage {
    source: PathBuf,
    bytes: Vec<u8>,
}

impl ProgramImage {
    /// Reads a program object from disk.
    pub fn from_path(path: impl AsRef<Path>) -> BpfResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| BpfError::load(format!("reading {}: {e}", path.display())))?;
        Ok(Self {
            source: path.to_path_buf(),
            bytes,
        })
    }

    /// Wraps bytes that are already in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            bytes: bytes.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ProgramImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramImage")
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A loaded program: its tables, counters and attach capability.
pub struct LoadedProgram {
    pub routes: RouteTable,
    pub interfaces: InterfaceTable,
    pub neighbors: NeighborTable,
    pub stats: StatsReader,
    pub attacher: Box<dyn Attacher>,
}

impl fmt::Debug for LoadedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedProgram")
            .field("routes", &self.routes)
            .field("interfaces", &self.interfaces)
            .field("neighbors", &self.neighbors)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Loads a program image.
///
/// A load either yields a complete [`LoadedProgram`] or fails; nothing is
/// left half-loaded.
pub trait ProgramLoader {
    fn load(&self, image: &ProgramImage) -> BpfResult<LoadedProgram>;
}

/// Loader for the kernel, backed by aya.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdpLoader {
    mode: XdpMode,
}

impl XdpLoader {
    pub fn new(mode: XdpMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> XdpMode {
        self.mode
    }
}

fn take_map(ebpf: &mut Ebpf, name: &str) -> BpfResult<Map> {
    ebpf.take_map(name)
        .ok_or_else(|| BpfError::load(format!("map {name} not found in program object")))
}

fn wrong_type(name: &str, err: impl fmt::Display) -> BpfError {
    BpfError::load(format!("map {name} has unexpected type: {err}"))
}

impl ProgramLoader for XdpLoader {
    fn load(&self, image: &ProgramImage) -> BpfResult<LoadedProgram> {
        let mut ebpf = Ebpf::load(image.bytes()).map_err(|e| BpfError::load(e.to_string()))?;

        let routes: LpmTrie<MapData, u32, NextHop> =
            LpmTrie::try_from(take_map(&mut ebpf, ROUTES_MAP)?)
                .map_err(|e| wrong_type(ROUTES_MAP, e))?;
        let interfaces: HashMap<MapData, u32, MacValue> =
            HashMap::try_from(take_map(&mut ebpf, INTERFACES_MAP)?)
                .map_err(|e| wrong_type(INTERFACES_MAP, e))?;
        let neighbors: HashMap<MapData, u32, MacValue> =
            HashMap::try_from(take_map(&mut ebpf, NEIGHBORS_MAP)?)
                .map_err(|e| wrong_type(NEIGHBORS_MAP, e))?;
        let stats: Array<MapData, DataRec> = Array::try_from(take_map(&mut ebpf, STATS_MAP)?)
            .map_err(|e| wrong_type(STATS_MAP, e))?;

        let program: &mut Xdp = ebpf
            .program_mut(PROGRAM_NAME)
            .ok_or_else(|| BpfError::load(format!("program {PROGRAM_NAME} not found")))?
            .try_into()
            .map_err(|e: ProgramError| BpfError::load(e.to_string()))?;
        program
            .load()
            .map_err(|e| BpfError::load(format!("verifier rejected {PROGRAM_NAME}: {e}")))?;

        info!(
            source = %image.source().display(),
            mode = %self.mode,
            "Data-plane program loaded"
        );

        Ok(LoadedProgram {
            routes: RouteTable::new(LpmTrieBackend::new(routes)),
            interfaces: InterfaceTable::new(HashMapBackend::new(interfaces)),
            neighbors: NeighborTable::new(HashMapBackend::new(neighbors)),
            stats: StatsReader::new(ArrayBackend::new(stats)),
            attacher: Box::new(XdpAttacher::new(ebpf, self.mode)),
        })
    }
}
