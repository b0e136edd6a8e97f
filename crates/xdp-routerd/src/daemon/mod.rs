//! RouterDaemon - lifecycle and polling for the data plane.
//!
//! The daemon moves through a fixed sequence of states:
//!
//! ```text
//! Uninitialized -> Loaded -> Attached -> ConfigApplied -> Polling -> ShuttingDown -> Terminated
//! ```
//!
//! A failure while loading goes straight to `Terminated`. A failure while
//! attaching or applying configuration goes through `ShuttingDown`, which
//! releases every attachment already made before the program is dropped.

mod routerd;
mod state;

pub use routerd::{shutdown_signal, PollReport, RouterDaemon};
pub use state::LifecycleState;
