//! Scripted interface resolver.

use nix::errno::Errno;
use std::collections::HashMap;
use xdp_router_types::MacAddress;
use xdp_routerd::{InterfaceResolver, ResolveError, ResolvedInterface};

/// Resolves only the interfaces it was given.
#[derive(Debug, Clone, Default)]
pub struct FakeResolver {
    interfaces: HashMap<String, ResolvedInterface>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interface whose MAC is derived from its index.
    pub fn with(self, name: &str, ifindex: u32) -> Self {
        let [a, b, c, d] = ifindex.to_be_bytes();
        self.with_mac(name, ifindex, MacAddress::new([0x02, 0x00, a, b, c, d]))
    }

    pub fn with_mac(mut self, name: &str, ifindex: u32, mac: MacAddress) -> Self {
        self.interfaces
            .insert(name.to_string(), ResolvedInterface::new(name, ifindex, mac));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedInterface> {
        self.interfaces.get(name)
    }
}

impl InterfaceResolver for FakeResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedInterface, ResolveError> {
        self.interfaces
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                name: name.to_string(),
                source: Errno::ENODEV,
            })
    }
}
