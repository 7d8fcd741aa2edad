//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the transition validator depends on:
//! - State access (identities, contracts, documents, chain data)
//! - Signature verification
//!
//! Validation only calls the read methods of [`StateRepository`]; the write
//! methods belong to the apply stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{DataContract, Document, Identity, IdentityPublicKey};
use crate::domain::query::DocumentQuery;
use crate::domain::value_objects::{BlockHeader, Hash, Identifier};
use crate::errors::StateRepositoryError;

/// Raw core-chain transaction bytes.
pub type RawTransaction = Vec<u8>;

/// Reference to one output of a core-chain transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction hash.
    pub txid: Hash,
    /// Output index.
    pub vout: u32,
}

// =============================================================================
// STATE REPOSITORY
// =============================================================================

/// Replicated platform state.
///
/// `Ok(None)` means "does not exist"; `Err` means the backend failed and the
/// verdict cannot be decided.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Identity by id.
    async fn fetch_identity(&self, id: &Identifier)
        -> Result<Option<Identity>, StateRepositoryError>;

    /// Data contract by id.
    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<DataContract>, StateRepositoryError>;

    /// Committed documents of one type matching `query`.
    async fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StateRepositoryError>;

    /// Core-chain transaction by hash.
    async fn fetch_transaction(
        &self,
        tx_hash: &Hash,
    ) -> Result<Option<RawTransaction>, StateRepositoryError>;

    /// Latest platform block header, if any block has been committed.
    async fn fetch_latest_platform_block_header(
        &self,
    ) -> Result<Option<BlockHeader>, StateRepositoryError>;

    /// Whether `height` is a chain-locked core height known to the platform.
    async fn verify_chain_lock_height(&self, height: u64) -> Result<bool, StateRepositoryError>;

    /// Whether an asset lock output was already consumed.
    async fn check_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<bool, StateRepositoryError>;

    /// Stores (or overwrites) a data contract.
    async fn store_data_contract(&self, contract: DataContract)
        -> Result<(), StateRepositoryError>;

    /// Stores (or overwrites) a document.
    async fn store_document(&self, document: Document) -> Result<(), StateRepositoryError>;

    /// Removes a document. Removing a missing document is not an error.
    async fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), StateRepositoryError>;
}

// =============================================================================
// SIGNER
// =============================================================================

/// Signature verification over a 32-byte message digest.
pub trait Signer: Send + Sync {
    /// True iff `signature` over `message_hash` verifies against `public_key`.
    ///
    /// Malformed keys or signatures verify as `false`.
    fn verify(&self, message_hash: &Hash, signature: &[u8], public_key: &IdentityPublicKey)
        -> bool;
}
