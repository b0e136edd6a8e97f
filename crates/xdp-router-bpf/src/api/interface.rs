//! Interface table codec.

use crate::table::{Table, TableCodec};
use crate::types::{MacValue, INTERFACES_MAP};
use xdp_router_types::{MacAddress, ParseError};

/// Codec for `ifmap`: ifindex to the interface's own MAC, used as the
/// source address on egress.
#[derive(Debug)]
pub struct InterfaceCodec;

impl TableCodec for InterfaceCodec {
    const NAME: &'static str = INTERFACES_MAP;
    type Key = u32;
    type Value = MacAddress;
    type RawKey = u32;
    type RawValue = MacValue;

    fn encode_key(key: &u32) -> Result<u32, ParseError> {
        Ok(*key)
    }

    fn encode_value(value: &MacAddress) -> Result<MacValue, ParseError> {
        Ok(MacValue {
            mac: *value.as_bytes(),
        })
    }

    fn decode_key(raw: &u32) -> u32 {
        *raw
    }

    fn decode_value(raw: &MacValue) -> MacAddress {
        MacAddress::new(raw.mac)
    }
}

/// The interface table.
pub type InterfaceTable = Table<InterfaceCodec>;
