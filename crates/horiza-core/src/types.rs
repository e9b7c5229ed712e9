// crates/horiza-core/src/types.rs
//
// Identifiers and amounts shared by every Horiza crate.
//
// Addresses are 20-byte account identifiers and hashes are 32-byte keccak256
// digests. Both serialize as 0x-prefixed lowercase hex so that JSON state
// files, RPC payloads, and off-chain snapshots agree on one encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::HorizaError;

/// Token amount in the smallest unit. 128 bits so that 18-decimal balances fit.
pub type Amount = u128;

/// Monotonic lock identifier. The first lock ever minted is 1.
pub type LockId = u64;

/// Sequential gauge identifier. The first gauge is 0.
pub type GaugeId = u64;

/// Epoch counter. Epoch 0 is the genesis epoch.
pub type Epoch = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Decode a hex string (with or without `0x`) into exactly `N` bytes.
pub fn decode_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], HorizaError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)
        .map_err(|e| HorizaError::InvalidInput(format!("invalid hex '{}': {}", s, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        HorizaError::InvalidInput(format!("expected {} bytes, got {}", N, b.len()))
    })
}

/// A 20-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = HorizaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex_fixed::<20>(s).map(Address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte digest (Merkle roots, leaves, proof nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash32(bytes)
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Hash32 {
    type Err = HorizaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex_fixed::<32>(s).map(Hash32)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter that carries an [`Amount`] as a decimal string.
///
/// JSON numbers routed through `serde_json::Value` cannot hold more than
/// 64 bits, so every amount crossing the RPC boundary uses this encoding.
/// Use with `#[serde(with = "horiza_core::types::amount_string")]`.
pub mod amount_string {
    use super::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.trim().parse::<Amount>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address([0xab; 20]);
        let s = addr.to_string();
        assert_eq!(s, format!("0x{}", "ab".repeat(20)));
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_parse_without_prefix() {
        let addr: Address = "3D6f08ae8C2931E27e95811E42F5d70164759a94".parse().unwrap();
        assert_eq!(addr.0[0], 0x3d);
        assert_eq!(addr.0[19], 0x94);
    }

    #[test]
    fn test_address_wrong_length_rejected() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_as_json_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(Address([1; 20]), 7u32);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::HashMap<Address, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&Address([1; 20])), Some(&7));
    }

    #[test]
    fn test_hash_serde() {
        let h = Hash32([0x11; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(32)));
        let back: Hash32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_amount_string_handles_large_values() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "amount_string")]
            amount: Amount,
        }

        let big: Amount = 2_600_000 * 10u128.pow(18);
        let json = serde_json::to_value(Wrapper { amount: big }).unwrap();
        assert_eq!(json["amount"], "2600000000000000000000000");
        let back: Wrapper = serde_json::from_value(json).unwrap();
        assert_eq!(back.amount, big);
    }
}
