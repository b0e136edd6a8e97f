//! RouteOrch - programs configured routes into the route table.
//!
//! Each configured route is resolved (egress interface to ifindex), encoded
//! and upserted in configuration order. The first failure stops the pass;
//! routes already written stay in the table.

mod orch;
mod types;

pub use orch::RouteOrch;
pub use types::RouteRequest;
