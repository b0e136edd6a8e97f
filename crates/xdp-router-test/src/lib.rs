//! Test infrastructure for the XDP router control plane.
//!
//! Provides:
//! - An in-memory data plane that stands in for the kernel program
//! - A scripted interface resolver
//! - Configuration fixtures
//! - Table verification helpers

pub mod fixtures;
mod dataplane;
mod resolver;
mod verification;

pub use dataplane::{AttachEvent, FakeAttacher, FakeDataPlane};
pub use fixtures::*;
pub use resolver::FakeResolver;
pub use verification::*;
