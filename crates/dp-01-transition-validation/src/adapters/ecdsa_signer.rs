//! secp256k1 ECDSA signature verification.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use tracing::warn;

use crate::domain::entities::IdentityPublicKey;
use crate::domain::value_objects::{Hash, KeyType};
use crate::ports::outbound::Signer;

/// Length of a compact `r || s` signature.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// [`Signer`] for [`KeyType::EcdsaSecp256k1`] keys.
///
/// Accepts a 64-byte `r || s` signature, or a 65-byte one with a leading
/// recovery byte (ignored). Other key types never verify.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaSigner;

impl EcdsaSigner {
    /// New signer.
    pub fn new() -> Self {
        Self
    }
}

fn compact_signature(signature: &[u8]) -> Option<Signature> {
    let compact = match signature.len() {
        COMPACT_SIGNATURE_LENGTH => signature,
        65 => &signature[1..],
        _ => return None,
    };
    Signature::from_slice(compact).ok()
}

impl Signer for EcdsaSigner {
    fn verify(&self, message_hash: &Hash, signature: &[u8], public_key: &IdentityPublicKey) -> bool {
        if public_key.key_type != KeyType::EcdsaSecp256k1 {
            warn!(
                key_id = public_key.id,
                key_type = ?public_key.key_type,
                "key type not supported by the secp256k1 signer"
            );
            return false;
        }

        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&public_key.data) else {
            return false;
        };
        let Some(signature) = compact_signature(signature) else {
            return false;
        };

        verifying_key.verify_prehash(message_hash, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{KeyPurpose, SecurityLevel};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;

    fn signing_key(byte: u8) -> SigningKey {
        SigningKey::from_bytes((&[byte; 32]).into()).unwrap()
    }

    fn public_key(signing_key: &SigningKey, key_type: KeyType) -> IdentityPublicKey {
        IdentityPublicKey {
            id: 0,
            key_type,
            purpose: KeyPurpose::Authentication,
            security_level: SecurityLevel::High,
            data: signing_key.verifying_key().to_sec1_bytes().to_vec(),
            disabled_at: None,
        }
    }

    fn sign(signing_key: &SigningKey, hash: &Hash) -> Vec<u8> {
        let signature: Signature = signing_key.sign_prehash(hash).unwrap();
        signature.to_bytes().to_vec()
    }

    #[test]
    fn test_valid_signature_verifies() {
        let key = signing_key(7);
        let hash = [0x42; 32];
        let signature = sign(&key, &hash);
        let public = public_key(&key, KeyType::EcdsaSecp256k1);
        assert!(EcdsaSigner.verify(&hash, &signature, &public));

        let mut with_recovery_byte = vec![0x1f];
        with_recovery_byte.extend_from_slice(&signature);
        assert!(EcdsaSigner.verify(&hash, &with_recovery_byte, &public));
    }

    #[test]
    fn test_wrong_message_or_key_fails() {
        let key = signing_key(7);
        let signature = sign(&key, &[0x42; 32]);
        assert!(!EcdsaSigner.verify(
            &[0x43; 32],
            &signature,
            &public_key(&key, KeyType::EcdsaSecp256k1)
        ));
        assert!(!EcdsaSigner.verify(
            &[0x42; 32],
            &signature,
            &public_key(&signing_key(8), KeyType::EcdsaSecp256k1)
        ));
    }

    #[test]
    fn test_malformed_inputs_fail() {
        let key = signing_key(7);
        let hash = [0x42; 32];
        let public = public_key(&key, KeyType::EcdsaSecp256k1);
        assert!(!EcdsaSigner.verify(&hash, &[0u8; 10], &public));
        assert!(!EcdsaSigner.verify(&hash, &[0u8; 64], &public));

        let mut broken = public.clone();
        broken.data = vec![0x05; 33];
        assert!(!EcdsaSigner.verify(&hash, &sign(&key, &hash), &broken));
    }

    #[test]
    fn test_other_key_types_never_verify() {
        let key = signing_key(7);
        let hash = [0x42; 32];
        let signature = sign(&key, &hash);
        for key_type in [KeyType::Bls12_381, KeyType::EcdsaHash160] {
            assert!(!EcdsaSigner.verify(&hash, &signature, &public_key(&key, key_type)));
        }
    }
}
