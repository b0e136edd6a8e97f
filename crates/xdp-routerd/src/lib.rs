//! XDP router control plane.
//!
//! `routerd` loads a precompiled XDP forwarding program, attaches it to the
//! configured interfaces, programs its route, interface and neighbor tables
//! from a YAML file, and then reports traffic counters and the route table
//! on a fixed interval until it is told to stop.
//!
//! ```text
//! [router.yaml] ──> [RouterConfig] ──> [RouterDaemon] ──> routes_map / ifmap / neigh_map
//!                                            │
//!                                            ├──> attach / detach per interface
//!                                            └──< xdp_stats_map (polling)
//! ```
//!
//! # Key Components
//!
//! - [`config`]: YAML configuration and validation
//! - [`resolver`]: Interface name to index and MAC resolution
//! - [`route`], [`intfs`], [`neigh`]: Per-table orchestration
//! - [`daemon`]: Lifecycle state machine and polling loop
//! - [`check`]: Offline configuration check

pub mod check;
pub mod config;
pub mod daemon;
pub mod error;
pub mod intfs;
pub mod neigh;
pub mod orch;
pub mod resolver;
pub mod route;

pub use check::{check_config, CheckReport};
pub use config::{parse_log_level, NeighborConfig, RouteConfig, RouterConfig};
pub use daemon::{LifecycleState, PollReport, RouterDaemon};
pub use error::{Result, RouterdError};
pub use resolver::{InterfaceResolver, ResolveError, ResolvedInterface, SystemResolver};
