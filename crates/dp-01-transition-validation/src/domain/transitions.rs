//! # State Transitions
//!
//! A document transition is a sum type over create, replace and delete, so
//! well-typed callers cannot express an unknown action. Data decoded from an
//! untrusted source arrives as [`RawDocumentTransition`] and is converted at
//! the boundary, where unknown actions and malformed shapes become consensus
//! errors.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{DataContract, DocumentData};
use super::validation_result::ValidationResult;
use super::value_objects::{DocumentAction, Hash, Identifier, TimestampMillis};
use crate::errors::BasicError;

// =============================================================================
// DOCUMENT TRANSITIONS
// =============================================================================

/// Identity fields shared by every document transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTransitionBase {
    /// Target document id.
    pub id: Identifier,
    /// Target document type.
    pub document_type: String,
    /// Contract defining the document type.
    pub data_contract_id: Identifier,
}

/// A proposed mutation of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentTransition {
    /// Create a document. Its id must derive from `entropy`.
    Create {
        base: DocumentTransitionBase,
        entropy: [u8; 32],
        created_at: Option<TimestampMillis>,
        updated_at: Option<TimestampMillis>,
        data: DocumentData,
    },
    /// Replace the data of a document, advancing its revision.
    Replace {
        base: DocumentTransitionBase,
        revision: u64,
        updated_at: Option<TimestampMillis>,
        data: DocumentData,
    },
    /// Delete a document. Carries no data.
    Delete {
        base: DocumentTransitionBase,
        revision: u64,
    },
}

impl DocumentTransition {
    /// Shared identity fields.
    #[must_use]
    pub fn base(&self) -> &DocumentTransitionBase {
        match self {
            Self::Create { base, .. } | Self::Replace { base, .. } | Self::Delete { base, .. } => {
                base
            }
        }
    }

    /// Target document id.
    #[must_use]
    pub fn id(&self) -> Identifier {
        self.base().id
    }

    /// Target document type.
    #[must_use]
    pub fn document_type(&self) -> &str {
        &self.base().document_type
    }

    /// Contract of the target document.
    #[must_use]
    pub fn data_contract_id(&self) -> Identifier {
        self.base().data_contract_id
    }

    /// Action of this transition.
    #[must_use]
    pub fn action(&self) -> DocumentAction {
        match self {
            Self::Create { .. } => DocumentAction::Create,
            Self::Replace { .. } => DocumentAction::Replace,
            Self::Delete { .. } => DocumentAction::Delete,
        }
    }

    /// Field data, absent for delete.
    #[must_use]
    pub fn data(&self) -> Option<&DocumentData> {
        match self {
            Self::Create { data, .. } | Self::Replace { data, .. } => Some(data),
            Self::Delete { .. } => None,
        }
    }
}

/// Document transition as decoded from an untrusted source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocumentTransition {
    #[serde(rename = "$action")]
    pub action: u8,
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$type")]
    pub document_type: String,
    #[serde(rename = "$dataContractId")]
    pub data_contract_id: Identifier,
    #[serde(rename = "$entropy", default)]
    pub entropy: Option<[u8; 32]>,
    #[serde(rename = "$revision", default)]
    pub revision: Option<u64>,
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<TimestampMillis>,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<TimestampMillis>,
    #[serde(default)]
    pub data: Option<DocumentData>,
}

fn schema_error(position: usize, keyword: &str, message: String) -> BasicError {
    BasicError::JsonSchema {
        keyword: keyword.to_string(),
        instance_path: format!("/transitions/{position}"),
        message,
    }
}

impl RawDocumentTransition {
    /// Converts into a typed transition. `position` is the index in the batch,
    /// used in error paths.
    pub fn decode(self, position: usize) -> Result<DocumentTransition, BasicError> {
        let action = DocumentAction::from_tag(self.action).ok_or(
            BasicError::InvalidDocumentTransitionAction {
                action: self.action,
            },
        )?;

        let base = DocumentTransitionBase {
            id: self.id,
            document_type: self.document_type,
            data_contract_id: self.data_contract_id,
        };

        match action {
            DocumentAction::Create => {
                let entropy = self.entropy.ok_or_else(|| {
                    schema_error(position, "required", "missing $entropy".into())
                })?;
                Ok(DocumentTransition::Create {
                    base,
                    entropy,
                    created_at: self.created_at,
                    updated_at: self.updated_at,
                    data: self.data.unwrap_or_default(),
                })
            }
            DocumentAction::Replace => {
                let revision = self.revision.ok_or_else(|| {
                    schema_error(position, "required", "missing $revision".into())
                })?;
                Ok(DocumentTransition::Replace {
                    base,
                    revision,
                    updated_at: self.updated_at,
                    data: self.data.unwrap_or_default(),
                })
            }
            DocumentAction::Delete => {
                if self.data.is_some() {
                    return Err(schema_error(
                        position,
                        "additionalProperties",
                        "delete transition must not carry data".into(),
                    ));
                }
                let revision = self.revision.ok_or_else(|| {
                    schema_error(position, "required", "missing $revision".into())
                })?;
                Ok(DocumentTransition::Delete { base, revision })
            }
        }
    }
}

/// Decodes every raw transition, collecting all errors.
///
/// The returned result carries the typed transitions only when every one of
/// them decoded.
#[must_use]
pub fn decode_document_transitions(
    raw: Vec<RawDocumentTransition>,
) -> ValidationResult<Vec<DocumentTransition>> {
    let mut result = ValidationResult::new();
    let mut transitions = Vec::with_capacity(raw.len());

    for (position, raw_transition) in raw.into_iter().enumerate() {
        match raw_transition.decode(position) {
            Ok(transition) => transitions.push(transition),
            Err(error) => result.add_error(error),
        }
    }

    if result.is_valid() {
        result.set_data(transitions);
    }
    result
}

// =============================================================================
// STATE TRANSITIONS
// =============================================================================

/// A signed batch of document transitions by one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsBatchTransition {
    /// Protocol version the batch was built for.
    pub protocol_version: u32,
    /// Acting identity; owner of every created document.
    pub owner_id: Identifier,
    /// Transitions in batch order.
    pub transitions: Vec<DocumentTransition>,
    /// Id of the identity key that signed the batch.
    pub signature_public_key_id: u32,
    /// Signature over [`StateTransition::signing_hash`].
    pub signature: Vec<u8>,
}

/// A signed request to publish a new data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContractCreateTransition {
    /// Protocol version the transition was built for.
    pub protocol_version: u32,
    /// Contract to publish. Its `owner_id` is the acting identity.
    pub data_contract: DataContract,
    /// Entropy the contract id derives from.
    pub entropy: [u8; 32],
    /// Id of the identity key that signed the transition.
    pub signature_public_key_id: u32,
    /// Signature over [`StateTransition::signing_hash`].
    pub signature: Vec<u8>,
}

/// Kind of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTransitionKind {
    /// Publish a data contract.
    DataContractCreate = 0,
    /// Mutate documents.
    DocumentsBatch = 1,
}

impl fmt::Display for StateTransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataContractCreate => f.write_str("data_contract_create"),
            Self::DocumentsBatch => f.write_str("documents_batch"),
        }
    }
}

/// A state transition submitted for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateTransition {
    /// Publish a data contract.
    DataContractCreate(DataContractCreateTransition),
    /// Mutate documents.
    DocumentsBatch(DocumentsBatchTransition),
}

impl StateTransition {
    /// Kind of this transition.
    #[must_use]
    pub fn kind(&self) -> StateTransitionKind {
        match self {
            Self::DataContractCreate(_) => StateTransitionKind::DataContractCreate,
            Self::DocumentsBatch(_) => StateTransitionKind::DocumentsBatch,
        }
    }

    /// Acting identity.
    #[must_use]
    pub fn owner_id(&self) -> Identifier {
        match self {
            Self::DataContractCreate(st) => st.data_contract.owner_id,
            Self::DocumentsBatch(st) => st.owner_id,
        }
    }

    /// Id of the signing key.
    #[must_use]
    pub fn signature_public_key_id(&self) -> u32 {
        match self {
            Self::DataContractCreate(st) => st.signature_public_key_id,
            Self::DocumentsBatch(st) => st.signature_public_key_id,
        }
    }

    /// Signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        match self {
            Self::DataContractCreate(st) => &st.signature,
            Self::DocumentsBatch(st) => &st.signature,
        }
    }

    /// Replaces the signature.
    pub fn set_signature(&mut self, signature: Vec<u8>) {
        match self {
            Self::DataContractCreate(st) => st.signature = signature,
            Self::DocumentsBatch(st) => st.signature = signature,
        }
    }

    /// Every field except the signature, bincode-encoded.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            Self::DataContractCreate(st) => bincode::serialize(&(
                StateTransitionKind::DataContractCreate as u8,
                st.protocol_version,
                &st.data_contract,
                &st.entropy,
                st.signature_public_key_id,
            )),
            Self::DocumentsBatch(st) => bincode::serialize(&(
                StateTransitionKind::DocumentsBatch as u8,
                st.protocol_version,
                &st.owner_id,
                &st.transitions,
                st.signature_public_key_id,
            )),
        }
    }

    /// Digest the acting identity signs: `sha256d(signable_bytes)`.
    pub fn signing_hash(&self) -> Result<Hash, bincode::Error> {
        Ok(shared_types::sha256d(&self.signable_bytes()?))
    }
}
