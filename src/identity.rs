//! Caller identity
//!
//! Identities are Ethereum-style account addresses. They are compared
//! case-insensitively, so every address is normalised to lowercase on parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]{40}$").expect("address pattern is valid"));

const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid address '{0}': expected 0x followed by 40 hex digits")]
    InvalidAddress(String),
}

/// An account address identifying a caller, author or editor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    /// Parse and normalise an address
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if !ADDRESS_PATTERN.is_match(trimmed) {
            return Err(IdentityError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", trimmed[2..].to_ascii_lowercase())))
    }

    /// The all-zero address
    #[cfg(test)]
    pub fn null() -> Self {
        Self(NULL_ADDRESS.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == NULL_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Identity::parse(&raw).map_err(serde::de::Error::custom)
    }
}
