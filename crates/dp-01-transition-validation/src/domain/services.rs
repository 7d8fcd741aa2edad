//! # Domain Services
//!
//! Deterministic derivations: document and contract identifiers, and the
//! double-SHA-256 multihash used by the name-service contract.

use shared_types::sha256d;

use super::value_objects::{Hash, Identifier};

/// Multihash code of double SHA-256.
pub const MULTIHASH_SHA256D_CODE: u8 = 0x56;

/// Digest length carried in the multihash header.
pub const MULTIHASH_DIGEST_LENGTH: u8 = 32;

/// Derives a document id from its creation inputs.
///
/// Two creates with identical inputs collide by construction.
#[must_use]
pub fn generate_document_id(
    data_contract_id: &Identifier,
    owner_id: &Identifier,
    document_type: &str,
    entropy: &[u8; 32],
) -> Identifier {
    let mut buf = Vec::with_capacity(32 + 32 + document_type.len() + 32);
    buf.extend_from_slice(data_contract_id.as_bytes());
    buf.extend_from_slice(owner_id.as_bytes());
    buf.extend_from_slice(document_type.as_bytes());
    buf.extend_from_slice(entropy);
    Identifier::new(sha256d(&buf))
}

/// Derives a data contract id from its owner and entropy.
#[must_use]
pub fn generate_data_contract_id(owner_id: &Identifier, entropy: &[u8; 32]) -> Identifier {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(owner_id.as_bytes());
    buf.extend_from_slice(entropy);
    Identifier::new(sha256d(&buf))
}

/// Double-SHA-256 multihash bytes: `0x56 0x20 ++ sha256d(data)`.
#[must_use]
pub fn multihash_sha256d(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + 32);
    out.push(MULTIHASH_SHA256D_CODE);
    out.push(MULTIHASH_DIGEST_LENGTH);
    out.extend_from_slice(&sha256d(data));
    out
}

/// Hex form of [`multihash_sha256d`], as stored in document fields.
#[must_use]
pub fn multihash_sha256d_hex(data: &[u8]) -> String {
    hex::encode(multihash_sha256d(data))
}

/// Parses a hex multihash, returning its digest if it is a well-formed
/// double-SHA-256 multihash.
#[must_use]
pub fn parse_multihash_hex(encoded: &str) -> Option<Hash> {
    let bytes = hex::decode(encoded).ok()?;
    match bytes.as_slice() {
        [MULTIHASH_SHA256D_CODE, MULTIHASH_DIGEST_LENGTH, digest @ ..] if digest.len() == 32 => {
            digest.try_into().ok()
        }
        _ => None,
    }
}
