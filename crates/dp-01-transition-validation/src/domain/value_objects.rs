//! # Value Objects
//!
//! Small immutable domain primitives: key attributes, index directions and
//! document actions.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use shared_types::{BlockHeader, Hash, Identifier};

/// Milliseconds since the Unix epoch.
pub type TimestampMillis = u64;

// =============================================================================
// IDENTITY KEY ATTRIBUTES
// =============================================================================

/// Algorithm of an identity public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Compressed secp256k1 public key (33 bytes).
    EcdsaSecp256k1 = 0,
    /// BLS12-381 public key (48 bytes).
    Bls12_381 = 1,
    /// HASH160 of a secp256k1 public key (20 bytes).
    EcdsaHash160 = 2,
}

/// What an identity public key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPurpose {
    /// Signing state transitions.
    Authentication = 0,
    /// Encrypting data for the identity.
    Encryption = 1,
    /// Decrypting data sent to the identity.
    Decryption = 2,
}

/// Security level of an identity public key. Lower is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// Identity management only.
    Master = 0,
    /// Critical operations.
    Critical = 1,
    /// Regular high-value operations.
    High = 2,
    /// Low-value operations.
    Medium = 3,
}

// =============================================================================
// INDEX DIRECTION
// =============================================================================

/// Sort direction of one index property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

// =============================================================================
// DOCUMENT ACTION
// =============================================================================

/// The action of a document transition.
///
/// Numeric tags are wire values: 0 create, 1 replace, 3 delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentAction {
    /// Create a new document.
    Create,
    /// Replace the data of an existing document.
    Replace,
    /// Delete an existing document.
    Delete,
}

impl DocumentAction {
    /// Wire tag of this action.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Create => 0,
            Self::Replace => 1,
            Self::Delete => 3,
        }
    }

    /// Parses a wire tag; `None` for tags outside the known set.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Create),
            1 => Some(Self::Replace),
            3 => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}
