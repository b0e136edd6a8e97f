//! Address encoding for data-plane table keys and values.
//!
//! The data plane keys its tables on 32-bit unsigned integers holding the
//! IPv4 address in network byte order semantics: the first octet of the
//! dotted quad occupies the most significant bits. Hardware addresses are
//! stored as raw 6-byte arrays.

use crate::{MacAddress, ParseError};
use std::net::{IpAddr, Ipv4Addr};

/// Encodes an IP address into the 32-bit table representation.
///
/// # Errors
///
/// Returns [`ParseError::InvalidAddressFamily`] for any IPv6 address,
/// including IPv4-mapped ones. Nothing is ever truncated.
pub fn encode_ipv4(addr: IpAddr) -> Result<u32, ParseError> {
    match addr {
        IpAddr::V4(v4) => Ok(u32::from(v4)),
        IpAddr::V6(_) => Err(ParseError::InvalidAddressFamily(addr)),
    }
}

/// Parses a textual IP address of either family.
pub fn parse_ip_addr(s: &str) -> Result<IpAddr, ParseError> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
}

/// Parses and encodes a textual IP address.
///
/// A string that is not an IP address at all yields
/// [`ParseError::InvalidIpAddress`]; a valid IPv6 literal yields
/// [`ParseError::InvalidAddressFamily`].
pub fn encode_ipv4_str(s: &str) -> Result<u32, ParseError> {
    encode_ipv4(parse_ip_addr(s)?)
}

/// Decodes the 32-bit table representation back into an address.
pub fn decode_ipv4(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw)
}

/// Encodes a textual hardware address into its 6-byte table value.
///
/// # Errors
///
/// Returns [`ParseError::InvalidMacFormat`] if the string is not six
/// hex octets separated by `:` or `-`.
pub fn encode_mac(s: &str) -> Result<[u8; 6], ParseError> {
    s.parse::<MacAddress>().map(<[u8; 6]>::from)
}
