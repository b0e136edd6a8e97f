//! Interface resolution.
//!
//! Configuration names interfaces; the data plane wants OS indexes, and the
//! interface table wants each interface's own hardware address.

use nix::errno::Errno;
use nix::ifaddrs::getifaddrs;
use nix::net::if_::if_nametoindex;
use thiserror::Error;
use tracing::warn;
use xdp_router_bpf::InterfaceRef;
use xdp_router_types::MacAddress;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("interface {name} not found: {source}")]
    NotFound {
        name: String,
        #[source]
        source: Errno,
    },

    #[error("listing interface addresses failed: {0}")]
    Os(#[source] Errno),
}

/// An interface with its index and MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterface {
    pub name: String,
    pub ifindex: u32,
    pub mac: MacAddress,
}

impl ResolvedInterface {
    pub fn new(name: impl Into<String>, ifindex: u32, mac: MacAddress) -> Self {
        Self {
            name: name.into(),
            ifindex,
            mac,
        }
    }

    pub fn to_ref(&self) -> InterfaceRef {
        InterfaceRef::new(self.name.clone(), self.ifindex)
    }
}

/// Looks interfaces up by name.
pub trait InterfaceResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedInterface, ResolveError>;
}

/// Resolver backed by the host's interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

/// Picks the first link-layer address listed for `name`.
///
/// Interfaces without one (tun devices, for example) get the zero MAC, which
/// the data plane never matches as a source.
fn link_address<I>(name: &str, links: I) -> MacAddress
where
    I: IntoIterator<Item = (String, Option<[u8; 6]>)>,
{
    links
        .into_iter()
        .filter(|(ifname, _)| ifname == name)
        .find_map(|(_, mac)| mac)
        .map(MacAddress::new)
        .unwrap_or_else(|| {
            warn!(interface = name, "No link-layer address, using {}", MacAddress::ZERO);
            MacAddress::ZERO
        })
}

impl InterfaceResolver for SystemResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedInterface, ResolveError> {
        let ifindex = if_nametoindex(name).map_err(|source| ResolveError::NotFound {
            name: name.to_string(),
            source,
        })?;
        let links = getifaddrs().map_err(ResolveError::Os)?.map(|ifaddr| {
            let mac = ifaddr
                .address
                .as_ref()
                .and_then(|addr| addr.as_link_addr())
                .and_then(|link| link.addr());
            (ifaddr.interface_name, mac)
        });
        let mac = link_address(name, links);
        Ok(ResolvedInterface::new(name, ifindex, mac))
    }
}
