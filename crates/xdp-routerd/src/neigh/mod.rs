//! NeighOrch - programs configured neighbors.
//!
//! Neighbor entries are supplied by configuration, never learned. Each
//! maps an IPv4 address to the MAC written as the destination address of
//! frames forwarded to it.

mod orch;

pub use orch::NeighOrch;
