//! Verification helpers for programmed tables.

use crate::FakeDataPlane;
use std::net::Ipv4Addr;
use thiserror::Error;
use xdp_router_bpf::types::{LpmKey, NextHop};
use xdp_router_bpf::MapBackend;
use xdp_router_types::MacAddress;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Expected route {addr}/{prefix_len} not found")]
    RouteNotFound { addr: Ipv4Addr, prefix_len: u32 },

    #[error("Route {addr}/{prefix_len}: expected {expected:?}, got {actual:?}")]
    RouteMismatch {
        addr: Ipv4Addr,
        prefix_len: u32,
        expected: NextHop,
        actual: NextHop,
    },

    #[error("Expected neighbor {0} not found")]
    NeighborNotFound(Ipv4Addr),

    #[error("Neighbor {ip}: expected {expected}, got {actual}")]
    NeighborMismatch {
        ip: Ipv4Addr,
        expected: MacAddress,
        actual: MacAddress,
    },

    #[error("Expected {expected} entries in {table}, found {actual}")]
    CountMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type VerifyResult<T> = Result<T, VerificationError>;

/// Reads back what was programmed into a [`FakeDataPlane`].
pub struct TableVerifier<'a> {
    dataplane: &'a FakeDataPlane,
}

impl<'a> TableVerifier<'a> {
    pub fn new(dataplane: &'a FakeDataPlane) -> Self {
        Self { dataplane }
    }

    /// Raw route entries, ordered by key.
    pub fn routes(&self) -> Vec<(LpmKey, NextHop)> {
        let mut routes = self.dataplane.routes.entries().unwrap_or_default();
        routes.sort_by_key(|(key, _)| (key.addr, key.prefix_len));
        routes
    }

    pub fn assert_route(&self, addr: Ipv4Addr, prefix_len: u32, expected: NextHop) -> VerifyResult<()> {
        let actual = self
            .dataplane
            .routes
            .lookup(&LpmKey::new(prefix_len, u32::from(addr)))
            .ok_or(VerificationError::RouteNotFound { addr, prefix_len })?;
        if actual != expected {
            return Err(VerificationError::RouteMismatch {
                addr,
                prefix_len,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_neighbor(&self, ip: Ipv4Addr, expected: MacAddress) -> VerifyResult<()> {
        let actual = self
            .dataplane
            .neighbors
            .lookup(&u32::from(ip))
            .map(|v| MacAddress::new(v.mac))
            .ok_or(VerificationError::NeighborNotFound(ip))?;
        if actual != expected {
            return Err(VerificationError::NeighborMismatch {
                ip,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn interface_mac(&self, ifindex: u32) -> Option<MacAddress> {
        self.dataplane
            .interfaces
            .lookup(&ifindex)
            .map(|v| MacAddress::new(v.mac))
    }

    pub fn assert_counts(&self, routes: usize, interfaces: usize, neighbors: usize) -> VerifyResult<()> {
        let checks = [
            ("routes_map", routes, self.dataplane.routes.len()),
            ("ifmap", interfaces, self.dataplane.interfaces.len()),
            ("neigh_map", neighbors, self.dataplane.neighbors.len()),
        ];
        for (table, expected, actual) in checks {
            if expected != actual {
                return Err(VerificationError::CountMismatch {
                    table,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
