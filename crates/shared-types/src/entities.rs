//! # Core Entities
//!
//! Identifiers, digests and the platform block header.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::errors::IdentifierError;

/// A 32-byte digest (SHA-256 family).
pub type Hash = [u8; 32];

// =============================================================================
// IDENTIFIER
// =============================================================================

/// A 32-byte identifier of an identity, data contract or document.
///
/// Document and contract identifiers are derived by hashing their creation
/// inputs, so two records built from the same inputs share an identifier.
///
/// Serializes as a hex string in human-readable formats (JSON config,
/// document fields) and as raw bytes otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(pub [u8; 32]);

impl Identifier {
    /// Length in bytes.
    pub const LENGTH: usize = 32;

    /// The all-zero identifier.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates an identifier from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates an identifier from a slice.
    pub fn from_slice(slice: &[u8]) -> Result<Self, IdentifierError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| IdentifierError::InvalidLength {
                expected: Self::LENGTH,
                actual: slice.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Parses a hex-encoded identifier.
    pub fn from_hex(encoded: &str) -> Result<Self, IdentifierError> {
        let bytes =
            hex::decode(encoded).map_err(|e| IdentifierError::InvalidEncoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding, used wherever an identifier is stored as a field value.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns true if this is the zero identifier.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            Self::from_hex(&encoded).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

impl From<[u8; 32]> for Identifier {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Identifier> for [u8; 32] {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

// =============================================================================
// PLATFORM BLOCK HEADER
// =============================================================================

/// The latest committed platform block header.
///
/// Time-window and chain-height-window checks read this; it is fetched once
/// per validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Platform block height.
    pub height: u64,
    /// Block time in milliseconds since the Unix epoch.
    pub time_ms: u64,
    /// Latest core chain height covered by a chain lock.
    pub core_chain_locked_height: u64,
}
