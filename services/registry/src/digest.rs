//! Content digests.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

use crate::error::RegistryError;

/// Identifies content by hash algorithm and hex encoded hash, written
/// `<algorithm>:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// The only algorithm blobs can be verified with.
    pub const SHA256: &'static str = "sha256";

    /// A `sha256` digest with the given hex hash.
    pub fn sha256(hex: impl Into<String>) -> Self {
        Self {
            algorithm: Self::SHA256.to_owned(),
            hex: hex.into(),
        }
    }

    /// Compute the `sha256` digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self::sha256(hex::encode(Sha256::digest(data)))
    }

    /// Hash algorithm, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Hex encoded hash.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((algorithm, hex)) if !algorithm.is_empty() && !hex.is_empty() => Ok(Self {
                algorithm: algorithm.to_owned(),
                hex: hex.to_owned(),
            }),
            _ => Err(RegistryError::InvalidDigest(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Digest {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.to_string()
    }
}
