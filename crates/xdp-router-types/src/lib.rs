//! Common types for the XDP router control plane.
//!
//! This crate provides the host-side representations of the values that
//! end up in the data-plane tables, and the codec that turns them into the
//! fixed-width encodings the data plane reads:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`Ipv4Prefix`]: IPv4 route destinations with a bounded prefix length
//! - [`codec`]: host address <-> table key/value encoding

pub mod codec;
mod ip;
mod mac;

pub use codec::{decode_ipv4, encode_ipv4, encode_ipv4_str, encode_mac, parse_ip_addr};
pub use ip::Ipv4Prefix;
pub use mac::MacAddress;

use std::net::IpAddr;

/// Common error type for parsing and encoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacFormat(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("address {0} is not representable as IPv4")]
    InvalidAddressFamily(IpAddr),

    #[error("invalid prefix length {0} (must be 0-32)")]
    InvalidPrefixLength(u32),
}
