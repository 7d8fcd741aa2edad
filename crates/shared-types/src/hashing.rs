//! # Hashing
//!
//! SHA-256 helpers. Identifier derivation and transition signing digests
//! both use the double-SHA-256 form.

use sha2::{Digest, Sha256};

use crate::entities::Hash;

/// Single SHA-256.
#[must_use]
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Double SHA-256 (`sha256(sha256(data))`).
#[must_use]
pub fn sha256d(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}
