use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::AddressError;

/// Largest salt accepted by instantiate2
pub const MAX_SALT_LEN: usize = 64;

/// Bech32 account or contract address
///
/// An `Address` only exists if its text decodes and re-encodes to the
/// identical string, so the payload and text can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    /// Canonical bech32 text
    text: String,
    /// Human readable network prefix
    prefix: String,
    /// Raw payload (20 bytes for accounts, 32 for instantiate2 contracts)
    payload: Vec<u8>,
}

impl Address {
    /// Decode a bech32 string, rejecting anything that does not round trip
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let (prefix, data, variant) = bech32::decode(text)
            .map_err(|e| AddressError::InvalidCreator(format!("{text}: {e}")))?;
        if variant != Variant::Bech32 {
            return Err(AddressError::InvalidCreator(format!(
                "{text}: bech32m is not used for account addresses"
            )));
        }
        let payload = Vec::<u8>::from_base32(&data)
            .map_err(|e| AddressError::InvalidCreator(format!("{text}: {e}")))?;
        if payload.is_empty() {
            return Err(AddressError::InvalidCreator(format!("{text}: empty payload")));
        }

        let address = Self::from_payload(&prefix, &payload)?;
        if address.text != text {
            return Err(AddressError::InvalidCreator(format!(
                "{text}: not in canonical form"
            )));
        }
        Ok(address)
    }

    /// Encode a raw payload under the given network prefix
    pub fn from_payload(prefix: &str, payload: &[u8]) -> Result<Self, AddressError> {
        let text = bech32::encode(prefix, payload.to_base32(), Variant::Bech32)
            .map_err(|e| AddressError::InvalidCreator(format!("{prefix}: {e}")))?;
        Ok(Self {
            text,
            prefix: prefix.to_string(),
            payload: payload.to_vec(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check the address belongs to the expected network
    pub fn ensure_prefix(&self, prefix: &str) -> Result<(), AddressError> {
        if self.prefix != prefix {
            return Err(AddressError::InvalidCreator(format!(
                "{}: expected prefix `{prefix}`, found `{}`",
                self.text, self.prefix
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.text
    }
}

/// SHA-256 checksum of an uploaded wasm code artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum([u8; 32]);

impl Checksum {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse the hex form used in transit, with or without a `0x` prefix
    pub fn from_hex(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed)
            .map_err(|e| AddressError::InvalidChecksum(format!("{input}: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            AddressError::InvalidChecksum(format!("{input}: expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Checksum {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.to_hex()
    }
}

/// Instantiate2 salt, the UTF-8 bytes of a human readable string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Salt(String);

impl Salt {
    pub fn new(text: impl Into<String>) -> Result<Self, AddressError> {
        let text = text.into();
        let len = text.len();
        if len == 0 || len > MAX_SALT_LEN {
            return Err(AddressError::InvalidSaltLength(len));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Salt {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Salt> for String {
    fn from(salt: Salt) -> Self {
        salt.0
    }
}

/// Token amount in the chain's base denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Logical role of a contract inside a deployment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractRole {
    /// Primary contract of a single deployment
    Primary,
    /// Treasury funding the other contracts
    Treasury,
    /// The i-th new contract of a shared-treasury batch
    Contract(usize),
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractRole::Primary => f.write_str("primary"),
            ContractRole::Treasury => f.write_str("treasury"),
            ContractRole::Contract(i) => write!(f, "contract-{i}"),
        }
    }
}

impl Serialize for ContractRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
