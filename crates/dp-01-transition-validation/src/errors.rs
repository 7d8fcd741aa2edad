//! # Error Types
//!
//! Two kinds of errors leave this crate:
//!
//! - [`ConsensusError`]: expected, data-dependent rejections. They are values,
//!   collected into a [`ValidationResult`](crate::domain::ValidationResult),
//!   and every node must produce the same ones in the same order. Each variant
//!   maps to exactly one numeric code that never changes meaning.
//! - [`ValidatorError`]: faults (repository failures, broken internal
//!   invariants). Returned through `Result` and never mixed into a verdict.
//!
//! ## Code Ranges
//!
//! | Range | Family |
//! |-------|--------|
//! | 1000-1999 | [`BasicError`] |
//! | 2000-2999 | [`SignatureError`] |
//! | 3000-3999 | [`FeeError`] |
//! | 4000-4999 | [`StateError`] |

use serde::{Deserialize, Serialize};
use shared_types::Identifier;
use thiserror::Error;

use crate::domain::entities::IndexDefinition;
use crate::domain::value_objects::{KeyPurpose, KeyType, SecurityLevel};

// =============================================================================
// CONSENSUS ERRORS
// =============================================================================

/// A document named by an error: its type and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Document type within the contract.
    pub document_type: String,
    /// Document identifier.
    pub document_id: Identifier,
}

impl std::fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document_type, self.document_id)
    }
}

fn join_references(references: &[DocumentReference]) -> String {
    references
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Consensus-level rejection reason.
///
/// Serialized as `{ "code": <u32>, "error": { "<Family>": <payload> } }`;
/// deserialization refuses a code that disagrees with the payload.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(into = "ConsensusErrorWire", try_from = "ConsensusErrorWire")]
pub enum ConsensusError {
    /// Malformed structure, schema violations.
    #[error(transparent)]
    Basic(#[from] BasicError),

    /// Identity and signature verification failures.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Balance and economic failures.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Conflicts with previously committed state.
    #[error(transparent)]
    State(#[from] StateError),
}

impl ConsensusError {
    /// Stable numeric code serialized to callers.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::Basic(e) => e.code(),
            Self::Signature(e) => e.code(),
            Self::Fee(e) => e.code(),
            Self::State(e) => e.code(),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum ConsensusErrorPayload {
    Basic(BasicError),
    Signature(SignatureError),
    Fee(FeeError),
    State(StateError),
}

#[derive(Serialize, Deserialize)]
struct ConsensusErrorWire {
    code: u32,
    error: ConsensusErrorPayload,
}

impl From<ConsensusError> for ConsensusErrorWire {
    fn from(error: ConsensusError) -> Self {
        let code = error.code();
        let error = match error {
            ConsensusError::Basic(e) => ConsensusErrorPayload::Basic(e),
            ConsensusError::Signature(e) => ConsensusErrorPayload::Signature(e),
            ConsensusError::Fee(e) => ConsensusErrorPayload::Fee(e),
            ConsensusError::State(e) => ConsensusErrorPayload::State(e),
        };
        Self { code, error }
    }
}

impl TryFrom<ConsensusErrorWire> for ConsensusError {
    type Error = String;

    fn try_from(wire: ConsensusErrorWire) -> Result<Self, Self::Error> {
        let error = match wire.error {
            ConsensusErrorPayload::Basic(e) => Self::Basic(e),
            ConsensusErrorPayload::Signature(e) => Self::Signature(e),
            ConsensusErrorPayload::Fee(e) => Self::Fee(e),
            ConsensusErrorPayload::State(e) => Self::State(e),
        };
        if error.code() == wire.code {
            Ok(error)
        } else {
            Err(format!(
                "consensus error code {} does not match payload code {}",
                wire.code,
                error.code()
            ))
        }
    }
}

/// Basic (structural) errors, codes 1000-1999.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BasicError {
    /// An instance violates its schema.
    #[error("JSON schema violation at '{instance_path}' ({keyword}): {message}")]
    JsonSchema {
        keyword: String,
        instance_path: String,
        message: String,
    },

    /// Two indices of one document type declare the same properties.
    #[error("Duplicate index '{index_name}' in document type '{document_type}'")]
    DuplicateIndex {
        document_type: String,
        index_name: String,
    },

    /// Data contract id does not match its derivation.
    #[error("Data contract id {actual} doesn't match derived id {expected}")]
    InvalidDataContractId {
        expected: Identifier,
        actual: Identifier,
    },

    /// Too many unique indices on one document type.
    #[error("Document type '{document_type}' has more than {limit} unique indices")]
    UniqueIndicesLimitReached { document_type: String, limit: usize },

    /// Referenced data contract is not committed.
    #[error("Data contract {data_contract_id} is not present")]
    DataContractNotPresent { data_contract_id: Identifier },

    /// Several transitions of the batch target the same document.
    #[error("Document transitions with duplicate ids: {}", join_references(.references))]
    DuplicateDocumentTransitionsWithIds { references: Vec<DocumentReference> },

    /// Several transitions of the batch collide on a unique index.
    #[error("Document transitions with duplicate unique index {index:?}: {}", join_references(.references))]
    DuplicateDocumentTransitionsWithIndices {
        references: Vec<DocumentReference>,
        index: IndexDefinition,
    },

    /// A compound unique index is only partially populated.
    #[error("Unique compound index properties {index_properties:?} of '{document_type}' are partially set")]
    InconsistentCompoundIndexData {
        document_type: String,
        index_properties: Vec<String>,
    },

    /// Action tag outside the known set.
    #[error("Document transition action {action} is not supported")]
    InvalidDocumentTransitionAction { action: u8 },

    /// Create transition id does not match its derivation.
    #[error("Document transition id {actual} doesn't match derived id {expected}")]
    InvalidDocumentTransitionId {
        expected: Identifier,
        actual: Identifier,
    },

    /// Document type is not defined by the contract.
    #[error("Document type '{document_type}' is not defined in data contract {data_contract_id}")]
    InvalidDocumentType {
        document_type: String,
        data_contract_id: Identifier,
    },
}

impl BasicError {
    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::JsonSchema { .. } => 1005,
            Self::DuplicateIndex { .. } => 1008,
            Self::InvalidDataContractId { .. } => 1011,
            Self::UniqueIndicesLimitReached { .. } => 1017,
            Self::DataContractNotPresent { .. } => 1018,
            Self::DuplicateDocumentTransitionsWithIds { .. } => 1019,
            Self::DuplicateDocumentTransitionsWithIndices { .. } => 1020,
            Self::InconsistentCompoundIndexData { .. } => 1021,
            Self::InvalidDocumentTransitionAction { .. } => 1022,
            Self::InvalidDocumentTransitionId { .. } => 1023,
            Self::InvalidDocumentType { .. } => 1024,
        }
    }
}

/// Identity and signature errors, codes 2000-2999.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SignatureError {
    /// Acting identity does not exist.
    #[error("Identity {identity_id} not found")]
    IdentityNotFound { identity_id: Identifier },

    /// Signing key type is not allowed for this transition.
    #[error("Public key type {public_key_type:?} is not allowed")]
    InvalidIdentityPublicKeyType { public_key_type: KeyType },

    /// Signature does not verify.
    #[error("Invalid state transition signature")]
    InvalidStateTransitionSignature,

    /// Identity has no key with the referenced id.
    #[error("Public key {public_key_id} is missing")]
    MissingPublicKey { public_key_id: u32 },

    /// Signing key security level is not allowed for this transition.
    #[error("Public key security level {public_key_security_level:?} is not allowed, expected one of {allowed_levels:?}")]
    InvalidSignaturePublicKeySecurityLevel {
        public_key_security_level: SecurityLevel,
        allowed_levels: Vec<SecurityLevel>,
    },

    /// Signing key has a purpose other than authentication.
    #[error("Public key purpose {public_key_purpose:?} doesn't match required {key_purpose_requirement:?}")]
    WrongPublicKeyPurpose {
        public_key_purpose: KeyPurpose,
        key_purpose_requirement: KeyPurpose,
    },

    /// Signing key was disabled.
    #[error("Public key {public_key_id} is disabled")]
    PublicKeyIsDisabled { public_key_id: u32 },
}

impl SignatureError {
    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::IdentityNotFound { .. } => 2000,
            Self::InvalidIdentityPublicKeyType { .. } => 2001,
            Self::InvalidStateTransitionSignature => 2002,
            Self::MissingPublicKey { .. } => 2003,
            Self::InvalidSignaturePublicKeySecurityLevel { .. } => 2004,
            Self::WrongPublicKeyPurpose { .. } => 2005,
            Self::PublicKeyIsDisabled { .. } => 2006,
        }
    }
}

/// Fee errors, codes 3000-3999.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FeeError {
    /// Identity balance does not cover the required amount.
    #[error("Balance {balance} is not enough, required {required}")]
    BalanceIsNotEnough { balance: u64, required: u64 },
}

impl FeeError {
    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::BalanceIsNotEnough { .. } => 3000,
        }
    }
}

/// State errors, codes 4000-4999.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StateError {
    /// Contract to create already exists.
    #[error("Data contract {data_contract_id} is already present")]
    DataContractAlreadyPresent { data_contract_id: Identifier },

    /// A data trigger rejected the document.
    #[error("Data trigger condition failed for document {document_transition_id}: {message}")]
    DataTriggerCondition {
        data_contract_id: Identifier,
        document_transition_id: Identifier,
        message: String,
    },

    /// A data trigger could not run to completion.
    #[error("Data trigger execution failed for document {document_transition_id}: {message}")]
    DataTriggerExecution {
        data_contract_id: Identifier,
        document_transition_id: Identifier,
        message: String,
    },

    /// Create targets an id that is already committed.
    #[error("Document {document_id} is already present")]
    DocumentAlreadyPresent { document_id: Identifier },

    /// Replace or delete targets an id that is not committed.
    #[error("Document {document_id} not found")]
    DocumentNotFound { document_id: Identifier },

    /// Replace or delete by an identity that does not own the document.
    #[error("Document {document_id} owner {document_owner_id} doesn't match existing owner {existing_document_owner_id}")]
    DocumentOwnerIdMismatch {
        document_id: Identifier,
        document_owner_id: Identifier,
        existing_document_owner_id: Identifier,
    },

    /// Create carries different `created_at` and `updated_at`.
    #[error("Document {document_id} createdAt and updatedAt timestamps are not equal")]
    DocumentTimestampsMismatch { document_id: Identifier },

    /// A document timestamp is too far from the block time.
    #[error("Document {document_id} {timestamp_name} {timestamp} is out of window [{time_window_start}, {time_window_end}]")]
    DocumentTimestampWindowViolation {
        timestamp_name: String,
        document_id: Identifier,
        timestamp: u64,
        time_window_start: u64,
        time_window_end: u64,
    },

    /// Document collides with a committed document on a unique index.
    #[error(
        "Document {document_id} has duplicate unique properties {:?} of index '{}' with other documents",
        .index.property_names(),
        .index.name
    )]
    DuplicateUniqueIndex {
        document_id: Identifier,
        index: IndexDefinition,
    },

    /// Declared revision is not exactly one past the committed revision.
    #[error("Document {document_id} revision {attempted_revision} is invalid, current revision is {current_revision}")]
    InvalidDocumentRevision {
        document_id: Identifier,
        current_revision: u64,
        attempted_revision: u64,
    },
}

impl StateError {
    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::DataContractAlreadyPresent { .. } => 4000,
            Self::DataTriggerCondition { .. } => 4001,
            Self::DataTriggerExecution { .. } => 4002,
            Self::DocumentAlreadyPresent { .. } => 4004,
            Self::DocumentNotFound { .. } => 4005,
            Self::DocumentOwnerIdMismatch { .. } => 4006,
            Self::DocumentTimestampsMismatch { .. } => 4007,
            Self::DocumentTimestampWindowViolation { .. } => 4008,
            Self::DuplicateUniqueIndex { .. } => 4009,
            Self::InvalidDocumentRevision { .. } => 4010,
        }
    }
}

// =============================================================================
// FAULT ERRORS
// =============================================================================

/// Errors from the state repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateRepositoryError {
    /// Backend could not be reached.
    #[error("state repository unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded.
    #[error("state repository data corrupted: {0}")]
    Corrupted(String),

    /// Query is malformed for this backend.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Faults raised by the validator. These indicate a bug or an unavailable
/// collaborator, never a rejected transition.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Repository call failed.
    #[error("repository error: {0}")]
    Repository(#[from] StateRepositoryError),

    /// Signable bytes could not be produced.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A contract that passed resolution is missing from the pass.
    #[error("data contract {0} was not resolved")]
    UnresolvedDataContract(Identifier),

    /// Apply was called for a document that does not exist.
    #[error("cannot apply transition: document {0} not found")]
    MissingDocument(Identifier),
}

impl From<bincode::Error> for ValidatorError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Invalid service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration text could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A system-contract binding uses the zero identifier.
    #[error("trigger binding `{binding}` uses the zero identifier")]
    ZeroIdentifier { binding: &'static str },

    /// Timestamp window must be positive.
    #[error("timestamp_window_ms must be greater than zero")]
    ZeroTimestampWindow,

    /// An allow-list is empty, so nothing could ever be signed.
    #[error("`{0}` must not be empty")]
    EmptyAllowList(&'static str),
}

// =============================================================================
// TESTS
// =============================================================================
