//! Safe Rust wrappers for the XDP router data plane.
//!
//! The data plane is a precompiled XDP program that forwards IPv4 packets
//! using three shared tables and keeps per-action counters. This crate
//! hides the kernel objects behind small traits so the control plane can
//! be driven against the real kernel or against in-process fakes.
//!
//! # Architecture
//!
//! - [`types`]: Wire layouts shared with the data plane and the fixed
//!   program/map names
//! - [`error`]: Error types for load, attach and table operations
//! - [`table`]: The generic [`Table`] over a [`MapBackend`]
//! - [`kernel`]: Backends over kernel maps
//! - [`memory`]: An in-process [`MemoryMap`] backend
//! - [`api`]: Route, neighbor and interface codecs and the
//!   statistics reader
//! - [`program`]: Program image loading
//! - [`attach`]: Per-interface attachment lifecycle
//!
//! # Example
//!
//! ```ignore
//! use xdp_router_bpf::{ProgramImage, ProgramLoader, XdpLoader, XdpMode};
//!
//! let image = ProgramImage::from_path("/usr/lib/xdp-router/router.o")?;
//! let mut program = XdpLoader::new(XdpMode::Generic).load(&image)?;
//! program.routes.upsert(&key, &next_hop)?;
//! ```

pub mod api;
pub mod attach;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod program;
pub mod table;
pub mod types;

pub use api::{
    Counters, InterfaceCodec, InterfaceTable, NeighborCodec, NeighborTable, RouteCodec, RouteKey,
    RouteTable, RouteValue, StatsReader, XdpAction,
};
pub use attach::{AttachmentHandle, AttachmentManager, Attacher, InterfaceRef, XdpAttacher};
pub use error::{BpfError, BpfResult};
pub use memory::MemoryMap;
pub use program::{LoadedProgram, ProgramImage, ProgramLoader, XdpLoader, XdpMode};
pub use table::{MapBackend, MapFault, Table, TableCodec};
