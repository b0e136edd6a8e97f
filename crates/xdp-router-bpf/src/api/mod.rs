//! Table codecs and readers for the data-plane maps.
//!
//! - [`route`]: IPv4 routes (LPM trie)
//! - [`neighbor`]: IPv4 neighbor to MAC mappings
//! - [`interface`]: ifindex to interface MAC mappings
//! - [`stats`]: per-action counters

pub mod interface;
pub mod neighbor;
pub mod route;
pub mod stats;

pub use interface::{InterfaceCodec, InterfaceTable};
pub use neighbor::{NeighborCodec, NeighborTable};
pub use route::{RouteCodec, RouteKey, RouteTable, RouteValue};
pub use stats::{Counters, StatsReader, XdpAction};
