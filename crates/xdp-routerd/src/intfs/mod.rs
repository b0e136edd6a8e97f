//! IntfsOrch - programs each attached interface's own MAC.
//!
//! The data plane rewrites the source MAC of a forwarded frame with the
//! egress interface's address, looked up by ifindex.

mod orch;

pub use orch::IntfsOrch;
