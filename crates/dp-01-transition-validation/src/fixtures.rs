//! Test fixtures: deterministic keys, identities, contracts and transitions.
//!
//! Compiled for this crate's tests and, with the `test-utils` feature, for
//! other crates' tests.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use std::collections::BTreeMap;

use crate::domain::entities::{
    DataContract, DocumentData, DocumentTypeDefinition, Identity, IdentityPublicKey,
    IndexDefinition, IndexProperty,
};
use crate::domain::services::{generate_data_contract_id, generate_document_id};
use crate::domain::transitions::{
    DataContractCreateTransition, DocumentTransition, DocumentTransitionBase,
    DocumentsBatchTransition, StateTransition,
};
use crate::domain::value_objects::{Identifier, KeyPurpose, KeyType, SecurityLevel};
use crate::errors::ValidatorError;

/// Protocol version used by fixture transitions.
pub const PROTOCOL_VERSION: u32 = 1;

/// Id of the authentication key on fixture identities.
pub const AUTH_KEY_ID: u32 = 0;

/// Deterministic secp256k1 key from a seed byte (must be non-zero).
pub fn signing_key(seed: u8) -> Result<SigningKey, ValidatorError> {
    SigningKey::from_bytes((&[seed; 32]).into())
        .map_err(|e| ValidatorError::Serialization(e.to_string()))
}

/// High-level authentication key for `signing_key`.
#[must_use]
pub fn authentication_key(id: u32, signing_key: &SigningKey) -> IdentityPublicKey {
    IdentityPublicKey {
        id,
        key_type: KeyType::EcdsaSecp256k1,
        purpose: KeyPurpose::Authentication,
        security_level: SecurityLevel::High,
        data: signing_key.verifying_key().to_sec1_bytes().to_vec(),
        disabled_at: None,
    }
}

/// Identity holding one authentication key at [`AUTH_KEY_ID`].
#[must_use]
pub fn identity(id: Identifier, signing_key: &SigningKey) -> Identity {
    Identity {
        id,
        balance: 1_000_000,
        revision: 0,
        public_keys: vec![authentication_key(AUTH_KEY_ID, signing_key)],
    }
}

/// Signs `transition` in place over its signing hash.
pub fn sign(transition: &mut StateTransition, signing_key: &SigningKey) -> Result<(), ValidatorError> {
    let hash = transition.signing_hash()?;
    let signature: Signature = signing_key
        .sign_prehash(&hash)
        .map_err(|e| ValidatorError::Serialization(e.to_string()))?;
    transition.set_signature(signature.to_bytes().to_vec());
    Ok(())
}

// =============================================================================
// CONTRACTS
// =============================================================================

/// Contract `profile` with a unique `(ownerId asc, email asc)` index.
#[must_use]
pub fn profile_contract(owner_id: Identifier, entropy: [u8; 32]) -> DataContract {
    let mut documents = BTreeMap::new();
    documents.insert(
        "profile".to_string(),
        DocumentTypeDefinition {
            schema: serde_json::json!({
                "type": "object",
                "properties": { "email": { "type": "string" } }
            }),
            indices: vec![IndexDefinition {
                name: "ownerEmail".into(),
                properties: vec![IndexProperty::asc("$ownerId"), IndexProperty::asc("email")],
                unique: true,
            }],
        },
    );
    DataContract {
        id: generate_data_contract_id(&owner_id, &entropy),
        owner_id,
        documents,
    }
}

/// Name-service contract with `domain` and `preorder` types.
#[must_use]
pub fn name_service_contract(owner_id: Identifier, entropy: [u8; 32]) -> DataContract {
    let mut documents = BTreeMap::new();
    documents.insert(
        "domain".to_string(),
        DocumentTypeDefinition {
            schema: serde_json::Value::Null,
            indices: vec![IndexDefinition {
                name: "parentNameAndLabel".into(),
                properties: vec![
                    IndexProperty::asc("normalizedParentDomainName"),
                    IndexProperty::asc("normalizedLabel"),
                ],
                unique: true,
            }],
        },
    );
    documents.insert(
        "preorder".to_string(),
        DocumentTypeDefinition {
            schema: serde_json::Value::Null,
            indices: vec![IndexDefinition {
                name: "saltedHash".into(),
                properties: vec![IndexProperty::asc("saltedDomainHash")],
                unique: true,
            }],
        },
    );
    DataContract {
        id: generate_data_contract_id(&owner_id, &entropy),
        owner_id,
        documents,
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Create transition with the derived id.
#[must_use]
pub fn create_transition(
    data_contract_id: Identifier,
    owner_id: Identifier,
    document_type: &str,
    entropy: [u8; 32],
    data: DocumentData,
) -> DocumentTransition {
    DocumentTransition::Create {
        base: DocumentTransitionBase {
            id: generate_document_id(&data_contract_id, &owner_id, document_type, &entropy),
            document_type: document_type.to_string(),
            data_contract_id,
        },
        entropy,
        created_at: None,
        updated_at: None,
        data,
    }
}

/// Replace transition.
#[must_use]
pub fn replace_transition(
    data_contract_id: Identifier,
    document_type: &str,
    id: Identifier,
    revision: u64,
    data: DocumentData,
) -> DocumentTransition {
    DocumentTransition::Replace {
        base: DocumentTransitionBase {
            id,
            document_type: document_type.to_string(),
            data_contract_id,
        },
        revision,
        updated_at: None,
        data,
    }
}

/// Delete transition.
#[must_use]
pub fn delete_transition(
    data_contract_id: Identifier,
    document_type: &str,
    id: Identifier,
    revision: u64,
) -> DocumentTransition {
    DocumentTransition::Delete {
        base: DocumentTransitionBase {
            id,
            document_type: document_type.to_string(),
            data_contract_id,
        },
        revision,
    }
}

/// Unsigned documents batch signed with [`AUTH_KEY_ID`].
#[must_use]
pub fn documents_batch(owner_id: Identifier, transitions: Vec<DocumentTransition>) -> StateTransition {
    StateTransition::DocumentsBatch(DocumentsBatchTransition {
        protocol_version: PROTOCOL_VERSION,
        owner_id,
        transitions,
        signature_public_key_id: AUTH_KEY_ID,
        signature: Vec::new(),
    })
}

/// Unsigned contract creation signed with [`AUTH_KEY_ID`].
#[must_use]
pub fn data_contract_create(data_contract: DataContract, entropy: [u8; 32]) -> StateTransition {
    StateTransition::DataContractCreate(DataContractCreateTransition {
        protocol_version: PROTOCOL_VERSION,
        data_contract,
        entropy,
        signature_public_key_id: AUTH_KEY_ID,
        signature: Vec::new(),
    })
}

/// Document data from `(field, value)` pairs.
#[must_use]
pub fn data(fields: &[(&str, serde_json::Value)]) -> DocumentData {
    fields
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}
