//! Route table codec.
//!
//! Routes are keyed on `(prefix_len, address)`. The data plane resolves a
//! destination by longest-prefix match, so distinct prefixes must remain
//! distinct keys: the address is stored exactly as configured, host bits
//! included.

use crate::table::{Table, TableCodec};
use crate::types::{LpmKey, NextHop, ROUTES_MAP};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use xdp_router_types::{decode_ipv4, encode_ipv4, Ipv4Prefix, ParseError};

/// Destination of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub destination: IpAddr,
    pub prefix_len: u32,
}

impl RouteKey {
    pub fn new(destination: impl Into<IpAddr>, prefix_len: u32) -> Self {
        Self {
            destination: destination.into(),
            prefix_len,
        }
    }
}

impl From<Ipv4Prefix> for RouteKey {
    fn from(prefix: Ipv4Prefix) -> Self {
        Self::new(prefix.address(), u32::from(prefix.prefix_len()))
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.destination, self.prefix_len)
    }
}

/// Next hop of a route.
///
/// A gateway of `0.0.0.0` marks a directly connected destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteValue {
    pub ifindex: u32,
    pub gateway: IpAddr,
}

impl RouteValue {
    pub fn new(ifindex: u32, gateway: impl Into<IpAddr>) -> Self {
        Self {
            ifindex,
            gateway: gateway.into(),
        }
    }

    /// Creates a next hop for a directly connected destination.
    pub fn direct(ifindex: u32) -> Self {
        Self::new(ifindex, Ipv4Addr::UNSPECIFIED)
    }

    /// Returns true if no gateway is set.
    pub fn is_direct(&self) -> bool {
        self.gateway.is_unspecified()
    }
}

impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "via {} dev {}", self.gateway, self.ifindex)
    }
}

/// Codec for `routes_map`.
#[derive(Debug)]
pub struct RouteCodec;

impl TableCodec for RouteCodec {
    const NAME: &'static str = ROUTES_MAP;
    type Key = RouteKey;
    type Value = RouteValue;
    type RawKey = LpmKey;
    type RawValue = NextHop;

    fn encode_key(key: &RouteKey) -> Result<LpmKey, ParseError> {
        let addr = encode_ipv4(key.destination)?;
        if key.prefix_len > u32::from(Ipv4Prefix::MAX_LEN) {
            return Err(ParseError::InvalidPrefixLength(key.prefix_len));
        }
        Ok(LpmKey::new(key.prefix_len, addr))
    }

    fn encode_value(value: &RouteValue) -> Result<NextHop, ParseError> {
        Ok(NextHop {
            ifindex: value.ifindex,
            gateway: encode_ipv4(value.gateway)?,
        })
    }

    fn decode_key(raw: &LpmKey) -> RouteKey {
        RouteKey::new(decode_ipv4(raw.addr), raw.prefix_len)
    }

    fn decode_value(raw: &NextHop) -> RouteValue {
        RouteValue::new(raw.ifindex, decode_ipv4(raw.gateway))
    }
}

/// The route table.
pub type RouteTable = Table<RouteCodec>;
