//! Route request types.

use crate::config::RouteConfig;
use crate::error::{Result, RouterdError};
use crate::resolver::InterfaceResolver;
use xdp_router_bpf::types::ROUTES_MAP;
use xdp_router_bpf::{BpfError, RouteKey, RouteValue};
use xdp_router_types::{parse_ip_addr, Ipv4Prefix};

/// A configured route resolved into table form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    /// Human-readable description used in logs and errors
    pub entity: String,
    pub key: RouteKey,
    pub value: RouteValue,
}

impl RouteRequest {
    /// Resolves a configured route.
    ///
    /// The destination must be an IPv4 address with a prefix length of at
    /// most 32. The gateway is narrowed to IPv4 by the table codec.
    pub fn from_config(route: &RouteConfig, resolver: &dyn InterfaceResolver) -> Result<Self> {
        let entity = route.to_string();

        let destination = parse_ip_addr(&route.destination)
            .and_then(|addr| Ipv4Prefix::from_ip(addr, route.prefixlen))
            .map_err(|e| RouterdError::table_write(&entity, BpfError::encode(ROUTES_MAP, e)))?;
        let gateway = parse_ip_addr(&route.gateway)
            .map_err(|e| RouterdError::table_write(&entity, BpfError::encode(ROUTES_MAP, e)))?;
        let iface = resolver
            .resolve(&route.interface)
            .map_err(|source| RouterdError::Resolve {
                entity: entity.clone(),
                source,
            })?;

        Ok(Self {
            key: RouteKey::from(destination),
            value: RouteValue::new(iface.ifindex, gateway),
            entity,
        })
    }
}
