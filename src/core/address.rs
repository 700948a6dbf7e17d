//! Ethereum-style addresses: `0x` + 40 hex chars.
//!
//! Original casing is preserved for display; equality is case-insensitive
//! because checksummed and lowercased forms of the same account must
//! compare equal (ownership filtering depends on this).

use crate::error::NodeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Address(String);

impl Address {
    /// Validate and wrap. Accepts any hex casing.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        let hex_part = s.strip_prefix("0x").ok_or(NodeError::InvalidAddress)?;
        if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
            return Err(NodeError::InvalidAddress);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display shortening: first 6 chars + ellipsis + last 4.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = NodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Quick validity check without constructing.
pub fn is_address(s: &str) -> bool {
    Address::parse(s).is_ok()
}
