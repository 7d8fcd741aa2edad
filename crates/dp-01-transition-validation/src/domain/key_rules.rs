//! Signing key requirements for state transitions.

use super::entities::{Identity, IdentityPublicKey};
use super::value_objects::{KeyPurpose, KeyType, SecurityLevel};
use crate::errors::SignatureError;

/// Resolves the key a transition claims to be signed with and checks that it
/// may sign: present, enabled, of an allowed type, for authentication, at an
/// allowed security level. Stops at the first failure.
pub fn check_signing_key<'a>(
    identity: &'a Identity,
    key_id: u32,
    allowed_key_types: &[KeyType],
    allowed_security_levels: &[SecurityLevel],
) -> Result<&'a IdentityPublicKey, SignatureError> {
    let key = identity
        .get_public_key_by_id(key_id)
        .ok_or(SignatureError::MissingPublicKey {
            public_key_id: key_id,
        })?;

    if key.disabled_at.is_some() {
        return Err(SignatureError::PublicKeyIsDisabled {
            public_key_id: key_id,
        });
    }

    if !allowed_key_types.contains(&key.key_type) {
        return Err(SignatureError::InvalidIdentityPublicKeyType {
            public_key_type: key.key_type,
        });
    }

    if key.purpose != KeyPurpose::Authentication {
        return Err(SignatureError::WrongPublicKeyPurpose {
            public_key_purpose: key.purpose,
            key_purpose_requirement: KeyPurpose::Authentication,
        });
    }

    if !allowed_security_levels.contains(&key.security_level) {
        return Err(SignatureError::InvalidSignaturePublicKeySecurityLevel {
            public_key_security_level: key.security_level,
            allowed_levels: allowed_security_levels.to_vec(),
        });
    }

    Ok(key)
}
