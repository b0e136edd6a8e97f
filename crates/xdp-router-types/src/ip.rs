//! IPv4 route prefix.

use crate::ParseError;
use std::net::{IpAddr, Ipv4Addr};

/// An IPv4 destination with its prefix length.
///
/// Host bits beyond the prefix length are preserved as given. The data
/// plane keys routes on the literal `(prefix_len, address)` pair, so the
/// control plane never rewrites the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Prefix {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Prefix {
    /// Maximum prefix length for IPv4.
    pub const MAX_LEN: u8 = 32;

    /// Creates a new IPv4 prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds 32.
    pub fn new(address: Ipv4Addr, prefix_len: u32) -> Result<Self, ParseError> {
        let prefix_len = u8::try_from(prefix_len)
            .ok()
            .filter(|len| *len <= Self::MAX_LEN)
            .ok_or(ParseError::InvalidPrefixLength(prefix_len))?;

        Ok(Ipv4Prefix {
            address,
            prefix_len,
        })
    }

    /// Creates a prefix from any IP address, rejecting IPv6.
    pub fn from_ip(address: IpAddr, prefix_len: u32) -> Result<Self, ParseError> {
        match address {
            IpAddr::V4(v4) => Self::new(v4, prefix_len),
            IpAddr::V6(_) => Err(ParseError::InvalidAddressFamily(address)),
        }
    }

    /// Returns the address of this prefix.
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}
