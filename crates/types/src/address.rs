//! Bech32 account addresses for the Meridian ledger.

use alloy::primitives::Address;
use bech32::{Bech32, Hrp};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Human-readable prefix of Meridian account addresses.
pub const ADDRESS_HRP: &str = "mer";

/// Errors arising while parsing a bech32 account address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The string is not well-formed bech32.
    #[error("invalid bech32 string: {0}")]
    Bech32(String),
    /// The human-readable prefix is not [`ADDRESS_HRP`].
    #[error("wrong address prefix: expected {ADDRESS_HRP}, got {0}")]
    WrongHrp(String),
    /// The decoded payload is not exactly 20 bytes.
    #[error("wrong payload length: expected 20 bytes, got {0}")]
    WrongLength(usize),
}

/// A 20-byte Meridian account address.
///
/// The wire representation is a bech32 string with the [`ADDRESS_HRP`]
/// prefix. The payload bytes are identical to the Ethereum-style address of
/// the same account, so conversion in either direction is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeAddress([u8; 20]);

impl NativeAddress {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse an address from its bech32 string form.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
        if hrp.as_str() != ADDRESS_HRP {
            return Err(AddressError::WrongHrp(hrp.to_string()));
        }
        let bytes: [u8; 20] =
            data.as_slice().try_into().map_err(|_| AddressError::WrongLength(data.len()))?;
        Ok(Self(bytes))
    }

    /// Encode the address to its bech32 string form.
    pub fn to_bech32(&self) -> String {
        self.to_string()
    }

    /// The raw 20-byte payload.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The Ethereum-style representation of this account.
    pub fn to_eth(self) -> Address {
        Address::from(self.0)
    }

    /// Convert an Ethereum-style address to its native representation.
    pub fn from_eth(address: Address) -> Self {
        Self(address.into())
    }

    fn hrp() -> Hrp {
        Hrp::parse_unchecked(ADDRESS_HRP)
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bech32::encode_lower_to_fmt::<Bech32, _>(f, Self::hrp(), &self.0).map_err(|_| fmt::Error)
    }
}

impl FromStr for NativeAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl From<Address> for NativeAddress {
    fn from(address: Address) -> Self {
        Self::from_eth(address)
    }
}

impl From<NativeAddress> for Address {
    fn from(address: NativeAddress) -> Self {
        address.to_eth()
    }
}

impl Serialize for NativeAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NativeAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(de::Error::custom)
    }
}
