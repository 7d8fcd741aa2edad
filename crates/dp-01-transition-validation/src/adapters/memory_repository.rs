//! In-memory state repository.
//!
//! Backs tests and single-process deployments. Documents are kept ordered by
//! `(contract, type, id)`, so query results come back in id order.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::entities::{DataContract, Document, Identity};
use crate::domain::query::{DocumentQuery, WhereOperator};
use crate::domain::value_objects::{BlockHeader, Hash, Identifier};
use crate::errors::StateRepositoryError;
use crate::ports::outbound::{OutPoint, RawTransaction, StateRepository};

type DocumentKey = (Identifier, String, Identifier);

#[derive(Default)]
struct State {
    identities: HashMap<Identifier, Identity>,
    contracts: HashMap<Identifier, DataContract>,
    documents: BTreeMap<DocumentKey, Document>,
    transactions: HashMap<Hash, RawTransaction>,
    latest_block_header: Option<BlockHeader>,
    used_out_points: HashSet<OutPoint>,
}

/// Thread-safe in-memory [`StateRepository`].
#[derive(Default)]
pub struct InMemoryStateRepository {
    state: RwLock<State>,
    failure: RwLock<Option<StateRepositoryError>>,
}

impl InMemoryStateRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an identity.
    pub fn insert_identity(&self, identity: Identity) {
        self.state.write().identities.insert(identity.id, identity);
    }

    /// Adds or replaces a data contract.
    pub fn insert_data_contract(&self, contract: DataContract) {
        self.state.write().contracts.insert(contract.id, contract);
    }

    /// Adds or replaces a document.
    pub fn insert_document(&self, document: Document) {
        let key = (document.data_contract_id, document.document_type.clone(), document.id);
        self.state.write().documents.insert(key, document);
    }

    /// Adds a core-chain transaction.
    pub fn insert_transaction(&self, tx_hash: Hash, transaction: RawTransaction) {
        self.state.write().transactions.insert(tx_hash, transaction);
    }

    /// Sets the latest platform block header.
    pub fn set_latest_block_header(&self, header: BlockHeader) {
        self.state.write().latest_block_header = Some(header);
    }

    /// Marks an asset lock output as consumed.
    pub fn mark_out_point_used(&self, out_point: OutPoint) {
        self.state.write().used_out_points.insert(out_point);
    }

    /// Makes every subsequent call fail with `error`, or heals with `None`.
    pub fn set_failure(&self, error: Option<StateRepositoryError>) {
        *self.failure.write() = error;
    }

    /// Committed document by key.
    pub fn get_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Option<Document> {
        self.state
            .read()
            .documents
            .get(&(*data_contract_id, document_type.to_string(), *id))
            .cloned()
    }

    /// Committed data contract by id.
    pub fn get_data_contract(&self, id: &Identifier) -> Option<DataContract> {
        self.state.read().contracts.get(id).cloned()
    }

    /// Number of committed documents.
    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    fn check_available(&self) -> Result<(), StateRepositoryError> {
        match self.failure.read().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn check_query(query: &DocumentQuery) -> Result<(), StateRepositoryError> {
    for clause in &query.where_clauses {
        if clause.operator == WhereOperator::In && !clause.value.is_array() {
            return Err(StateRepositoryError::InvalidQuery(format!(
                "`in` operand for {} must be an array",
                clause.property
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn fetch_identity(
        &self,
        id: &Identifier,
    ) -> Result<Option<Identity>, StateRepositoryError> {
        self.check_available()?;
        Ok(self.state.read().identities.get(id).cloned())
    }

    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<DataContract>, StateRepositoryError> {
        self.check_available()?;
        Ok(self.get_data_contract(id))
    }

    async fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StateRepositoryError> {
        self.check_available()?;
        check_query(query)?;
        let state = self.state.read();
        Ok(state
            .documents
            .values()
            .filter(|document| {
                document.data_contract_id == *data_contract_id
                    && document.document_type == document_type
                    && query.matches(document)
            })
            .cloned()
            .collect())
    }

    async fn fetch_transaction(
        &self,
        tx_hash: &Hash,
    ) -> Result<Option<RawTransaction>, StateRepositoryError> {
        self.check_available()?;
        Ok(self.state.read().transactions.get(tx_hash).cloned())
    }

    async fn fetch_latest_platform_block_header(
        &self,
    ) -> Result<Option<BlockHeader>, StateRepositoryError> {
        self.check_available()?;
        Ok(self.state.read().latest_block_header)
    }

    async fn verify_chain_lock_height(&self, height: u64) -> Result<bool, StateRepositoryError> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .latest_block_header
            .is_some_and(|header| height <= header.core_chain_locked_height))
    }

    async fn check_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<bool, StateRepositoryError> {
        self.check_available()?;
        Ok(self.state.read().used_out_points.contains(out_point))
    }

    async fn store_data_contract(
        &self,
        contract: DataContract,
    ) -> Result<(), StateRepositoryError> {
        self.check_available()?;
        self.insert_data_contract(contract);
        Ok(())
    }

    async fn store_document(&self, document: Document) -> Result<(), StateRepositoryError> {
        self.check_available()?;
        self.insert_document(document);
        Ok(())
    }

    async fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), StateRepositoryError> {
        self.check_available()?;
        self.state
            .write()
            .documents
            .remove(&(*data_contract_id, document_type.to_string(), *id));
        Ok(())
    }
}
