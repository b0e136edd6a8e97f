//! Configuration fixtures for common router setups.

use xdp_routerd::{NeighborConfig, RouteConfig, RouterConfig};

/// A directly connected route.
pub fn route(destination: &str, prefixlen: u32, interface: &str) -> RouteConfig {
    route_via(destination, prefixlen, interface, "0.0.0.0")
}

/// A route through a gateway.
pub fn route_via(destination: &str, prefixlen: u32, interface: &str, gateway: &str) -> RouteConfig {
    RouteConfig {
        destination: destination.to_string(),
        prefixlen,
        interface: interface.to_string(),
        gateway: gateway.to_string(),
    }
}

pub fn neighbor(ip: &str, mac: &str) -> NeighborConfig {
    NeighborConfig {
        ip: ip.to_string(),
        mac: mac.to_string(),
    }
}

/// Configuration attaching to `interfaces` with nothing else set.
pub fn router_config(interfaces: &[&str]) -> RouterConfig {
    RouterConfig::new(interfaces.iter().map(|s| s.to_string()).collect())
}

/// Two veths with a connected /24 behind each and one known neighbor.
pub mod veth_fixtures {
    use super::*;
    use crate::FakeResolver;

    pub const VETH0_IFINDEX: u32 = 4;
    pub const VETH1_IFINDEX: u32 = 5;

    pub fn resolver() -> FakeResolver {
        FakeResolver::new()
            .with("veth0", VETH0_IFINDEX)
            .with("veth1", VETH1_IFINDEX)
    }

    pub fn config() -> RouterConfig {
        let mut config = router_config(&["veth0", "veth1"]);
        config.routes = vec![route("10.0.0.0", 24, "veth0"), route("10.1.0.0", 24, "veth1")];
        config.neighbors = vec![neighbor("10.1.0.2", "c6:9f:fb:e6:cc:1f")];
        config
    }
}
