//! # DP-01 Transition Validation - Document State Transition Subsystem
//!
//! **Subsystem ID:** 1
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Decides whether a signed state transition (a batch of document
//! create/replace/delete operations, or a data contract creation) may be
//! applied to platform state. Every node runs the same checks in the same
//! order and must reach the same verdict with the same error codes.
//!
//! ## Validation Phases (documents batch)
//!
//! | # | Phase | Errors | Location |
//! |---|-------|--------|----------|
//! | 1 | Identity and signing key | 2000-2006 | `domain/key_rules.rs` |
//! | 2 | Contracts, types, create ids | 1018, 1023, 1024 | `service/mod.rs` |
//! | 3 | Action against committed state | 4004-4010 | `domain/action_rules.rs` |
//! | 4 | Duplicates by id and unique index | 1019-1021, 4009 | `domain/duplicates.rs` |
//! | 5 | Signature | 2002 | `adapters/ecdsa_signer.rs` |
//! | 6 | Data triggers | 4001, 4002 | `triggers/` |
//!
//! A failing phase ends the pass; findings inside a phase are all collected.
//!
//! ## Rejections vs Faults
//!
//! Rejections are [`ConsensusError`](errors::ConsensusError) values inside a
//! [`ValidationResult`](domain::ValidationResult). Repository and encoding
//! failures are [`ValidatorError`](errors::ValidatorError) faults and never
//! turn into a verdict.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `StateRepository` | Identities, contracts, documents, chain data |
//! | `Signer` | Verifies the transition signature |
//!
//! ## Usage Example
//!
//! ```ignore
//! use dp_01_transition_validation::prelude::*;
//!
//! let validator = BatchValidator::new(repository, Arc::new(EcdsaSigner::new()), config)?;
//! let result = validator.validate_transition(&transition).await?;
//! if result.is_valid() {
//!     validator.apply_transition(&transition).await?;
//! }
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;
pub mod triggers;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Data model
    pub use crate::domain::entities::{
        DataContract, Document, DocumentData, DocumentTypeDefinition, Identity,
        IdentityPublicKey, IndexDefinition, IndexProperty,
    };
    pub use crate::domain::transitions::{
        DataContractCreateTransition, DocumentTransition, DocumentTransitionBase,
        DocumentsBatchTransition, StateTransition, StateTransitionKind,
    };
    pub use crate::domain::validation_result::ValidationResult;
    pub use crate::domain::value_objects::{
        BlockHeader, DocumentAction, Hash, Identifier, KeyPurpose, KeyType, SecurityLevel,
    };

    // Domain services
    pub use crate::domain::query::{DocumentQuery, WhereClause, WhereOperator};
    pub use crate::domain::services::{generate_data_contract_id, generate_document_id};

    // Errors
    pub use crate::errors::{
        BasicError, ConfigError, ConsensusError, FeeError, SignatureError, StateError,
        StateRepositoryError, ValidatorError,
    };

    // Ports
    pub use crate::ports::inbound::StateTransitionValidationApi;
    pub use crate::ports::outbound::{OutPoint, RawTransaction, Signer, StateRepository};

    // Triggers
    pub use crate::triggers::{
        DataTrigger, DataTriggerConfig, DataTriggerExecutionContext, DataTriggerFunction,
        DataTriggerRegistry,
    };

    // Adapters
    pub use crate::adapters::{EcdsaSigner, InMemoryStateRepository};

    // Service
    pub use crate::service::{BatchValidator, ServiceConfig};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
