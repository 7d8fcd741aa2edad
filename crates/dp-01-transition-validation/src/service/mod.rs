//! # Batch Validator Service
//!
//! Orchestrates a full validation pass over one state transition.
//!
//! ## Documents Batch Phases
//!
//! | # | Phase | Stops the pass on failure |
//! |---|-------|---------------------------|
//! | 1 | Acting identity and signing key | yes |
//! | 2 | Data contracts, document types, create ids | yes |
//! | 3 | Action legality against committed state | yes |
//! | 4 | Duplicates by id and by unique index | yes |
//! | 5 | Signature | yes |
//! | 6 | Data triggers | - |
//!
//! Inside a phase every finding is collected. Repository lookups of one phase
//! run concurrently; results are merged in batch order, then in index
//! declaration order, then in trigger registration order.
//!
//! ## Data Contract Creation
//!
//! Phase 1, then contract structure and absence, then the signature.

mod config;

pub use config::ServiceConfig;

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::action_rules::{validate_actions_against_state, TimestampWindow};
use crate::domain::contract_rules::validate_data_contract_structure;
use crate::domain::duplicates::{
    find_duplicates_by_id, match_committed_duplicates, plan_unique_index_checks,
};
use crate::domain::entities::{DataContract, Document, Identity, IdentityPublicKey};
use crate::domain::key_rules::check_signing_key;
use crate::domain::query::{DocumentQuery, WhereClause};
use crate::domain::services::generate_document_id;
use crate::domain::transitions::{
    DataContractCreateTransition, DocumentTransition, DocumentsBatchTransition, StateTransition,
};
use crate::domain::validation_result::ValidationResult;
use crate::domain::value_objects::{BlockHeader, Identifier};
use crate::errors::{
    BasicError, ConfigError, ConsensusError, SignatureError, StateError, ValidatorError,
};
use crate::ports::inbound::StateTransitionValidationApi;
use crate::ports::outbound::{Signer, StateRepository};
use crate::triggers::{execute_data_triggers, DataTriggerExecutionContext, DataTriggerRegistry};

fn rejected(error: impl Into<ConsensusError>) -> ValidationResult {
    let error: ConsensusError = error.into();
    ValidationResult::from(error)
}

/// Logs the codes of a rejecting phase.
fn log_rejection(phase: &str, result: &ValidationResult) {
    let codes: Vec<u32> = result.errors().iter().map(|e| e.code()).collect();
    warn!(phase, ?codes, "state transition rejected");
}

/// Validates and applies state transitions.
pub struct BatchValidator<R, S>
where
    R: StateRepository,
    S: Signer,
{
    repository: Arc<R>,
    signer: Arc<S>,
    registry: DataTriggerRegistry,
    config: ServiceConfig,
}

impl<R, S> BatchValidator<R, S>
where
    R: StateRepository,
    S: Signer,
{
    /// Creates a validator with the built-in triggers of `config`.
    pub fn new(repository: Arc<R>, signer: Arc<S>, config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = DataTriggerRegistry::from_config(&config.triggers);
        debug!(triggers = registry.len(), "data trigger registry built");
        Ok(Self {
            repository,
            signer,
            registry,
            config,
        })
    }

    /// Replaces the trigger registry.
    #[must_use]
    pub fn with_registry(mut self, registry: DataTriggerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs every validation phase against current state.
    #[instrument(
        skip(self, transition),
        fields(kind = %transition.kind(), owner_id = %transition.owner_id())
    )]
    pub async fn validate_transition(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, ValidatorError> {
        let result = match transition {
            StateTransition::DocumentsBatch(batch) => {
                self.validate_documents_batch(transition, batch).await?
            }
            StateTransition::DataContractCreate(create) => {
                self.validate_data_contract_create(transition, create).await?
            }
        };

        if result.is_valid() {
            info!("state transition is valid");
        }
        Ok(result)
    }

    // =========================================================================
    // DOCUMENTS BATCH
    // =========================================================================

    async fn validate_documents_batch(
        &self,
        transition: &StateTransition,
        batch: &DocumentsBatchTransition,
    ) -> Result<ValidationResult, ValidatorError> {
        let owner_id = batch.owner_id;
        debug!(documents = batch.transitions.len(), "validating documents batch");

        // Phase 1
        let identity = match self.resolve_identity(transition).await? {
            Ok(identity) => identity,
            Err(result) => return Ok(result),
        };
        let signing_key = match self.check_key(&identity, transition) {
            Ok(key) => key,
            Err(result) => return Ok(result),
        };

        // Phase 2
        let (contracts, result) = self.resolve_contracts(&batch.transitions).await?;
        if !result.is_valid() {
            log_rejection("data_contracts", &result);
            return Ok(result);
        }
        let result = check_document_types(&batch.transitions, &owner_id, &contracts);
        if !result.is_valid() {
            log_rejection("document_types", &result);
            return Ok(result);
        }

        // Phase 3
        let header = self.repository.fetch_latest_platform_block_header().await?;
        let committed = self.fetch_committed_documents(&batch.transitions).await?;
        let window = header
            .as_ref()
            .map(|h| TimestampWindow::around(h.time_ms, self.config.timestamp_window_ms));
        let result =
            validate_actions_against_state(&batch.transitions, &owner_id, &committed, window.as_ref());
        if !result.is_valid() {
            log_rejection("document_state", &result);
            return Ok(result);
        }

        // Phase 4
        let result = self
            .find_duplicates(&batch.transitions, owner_id, &contracts)
            .await?;
        if !result.is_valid() {
            log_rejection("duplicates", &result);
            return Ok(result);
        }

        // Phase 5
        let result = self.verify_signature(transition, signing_key)?;
        if !result.is_valid() {
            log_rejection("signature", &result);
            return Ok(result);
        }

        // Phase 6
        let result = self
            .execute_triggers(&batch.transitions, owner_id, &contracts, header.as_ref())
            .await?;
        if !result.is_valid() {
            log_rejection("data_triggers", &result);
        }
        Ok(result)
    }

    /// The acting identity, or the rejection if it does not exist.
    async fn resolve_identity(
        &self,
        transition: &StateTransition,
    ) -> Result<Result<Identity, ValidationResult>, ValidatorError> {
        let identity_id = transition.owner_id();
        match self.repository.fetch_identity(&identity_id).await? {
            Some(identity) => Ok(Ok(identity)),
            None => {
                let result = rejected(SignatureError::IdentityNotFound { identity_id });
                log_rejection("identity", &result);
                Ok(Err(result))
            }
        }
    }

    fn check_key<'a>(
        &self,
        identity: &'a Identity,
        transition: &StateTransition,
    ) -> Result<&'a IdentityPublicKey, ValidationResult> {
        check_signing_key(
            identity,
            transition.signature_public_key_id(),
            &self.config.allowed_key_types,
            &self.config.allowed_security_levels,
        )
        .map_err(|error| {
            let result = rejected(error);
            log_rejection("signing_key", &result);
            result
        })
    }

    /// Fetches every referenced contract, in first-reference order.
    async fn resolve_contracts(
        &self,
        transitions: &[DocumentTransition],
    ) -> Result<(HashMap<Identifier, DataContract>, ValidationResult), ValidatorError> {
        let mut ids: Vec<Identifier> = Vec::new();
        for transition in transitions {
            let id = transition.data_contract_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let fetched = join_all(ids.iter().map(|id| self.repository.fetch_data_contract(id))).await;

        let mut contracts = HashMap::with_capacity(ids.len());
        let mut result = ValidationResult::new();
        for (id, contract) in ids.into_iter().zip(fetched) {
            match contract? {
                Some(contract) => {
                    contracts.insert(id, contract);
                }
                None => result.add_error(BasicError::DataContractNotPresent {
                    data_contract_id: id,
                }),
            }
        }
        Ok((contracts, result))
    }

    /// Committed documents targeted by the batch, keyed by id. One `$id in`
    /// query per `(contract, type)`.
    async fn fetch_committed_documents(
        &self,
        transitions: &[DocumentTransition],
    ) -> Result<HashMap<Identifier, Document>, ValidatorError> {
        let mut groups: Vec<((Identifier, &str), Vec<serde_json::Value>)> = Vec::new();
        for transition in transitions {
            let key = (transition.data_contract_id(), transition.document_type());
            let id = serde_json::Value::String(transition.id().to_hex());
            match groups.iter_mut().find(|(group, _)| *group == key) {
                Some((_, ids)) => ids.push(id),
                None => groups.push((key, vec![id])),
            }
        }

        let fetched = join_all(groups.into_iter().map(|((contract_id, document_type), ids)| {
            let query = DocumentQuery::new(vec![WhereClause::within("$id", ids)]);
            async move {
                self.repository
                    .fetch_documents(&contract_id, document_type, &query)
                    .await
            }
        }))
        .await;

        let mut committed = HashMap::new();
        for documents in fetched {
            for document in documents? {
                committed.insert(document.id, document);
            }
        }
        Ok(committed)
    }

    async fn find_duplicates(
        &self,
        transitions: &[DocumentTransition],
        owner_id: Identifier,
        contracts: &HashMap<Identifier, DataContract>,
    ) -> Result<ValidationResult, ValidatorError> {
        let mut result = find_duplicates_by_id(transitions);

        let checks = plan_unique_index_checks(transitions, owner_id, contracts);
        let fetched = join_all(checks.iter().map(|check| async move {
            match &check.lookup {
                Some(lookup) => self
                    .repository
                    .fetch_documents(
                        &lookup.data_contract_id,
                        &lookup.document_type,
                        &lookup.query,
                    )
                    .await
                    .map(Some),
                None => Ok(None),
            }
        }))
        .await;

        // Per index: in-batch findings, then committed collisions.
        for (check, committed) in checks.into_iter().zip(fetched) {
            result.merge(check.in_batch);
            if let (Some(lookup), Some(committed)) = (&check.lookup, committed?) {
                result.merge(match_committed_duplicates(lookup, &committed));
            }
        }
        Ok(result)
    }

    fn verify_signature(
        &self,
        transition: &StateTransition,
        key: &IdentityPublicKey,
    ) -> Result<ValidationResult, ValidatorError> {
        let hash = transition.signing_hash()?;
        if self.signer.verify(&hash, transition.signature(), key) {
            Ok(ValidationResult::new())
        } else {
            Ok(rejected(SignatureError::InvalidStateTransitionSignature))
        }
    }

    async fn execute_triggers(
        &self,
        transitions: &[DocumentTransition],
        owner_id: Identifier,
        contracts: &HashMap<Identifier, DataContract>,
        header: Option<&BlockHeader>,
    ) -> Result<ValidationResult, ValidatorError> {
        let mut jobs = Vec::with_capacity(transitions.len());
        for transition in transitions {
            let contract_id = transition.data_contract_id();
            let data_contract = contracts
                .get(&contract_id)
                .ok_or(ValidatorError::UnresolvedDataContract(contract_id))?;
            let context = DataTriggerExecutionContext {
                state_repository: self.repository.as_ref(),
                owner_id,
                data_contract,
                latest_block_header: header,
            };
            jobs.push((transition, context));
        }

        Ok(execute_data_triggers(&self.registry, &jobs).await?)
    }

    // =========================================================================
    // DATA CONTRACT CREATION
    // =========================================================================

    async fn validate_data_contract_create(
        &self,
        transition: &StateTransition,
        create: &DataContractCreateTransition,
    ) -> Result<ValidationResult, ValidatorError> {
        let contract = &create.data_contract;
        debug!(data_contract_id = %contract.id, "validating data contract create");

        let identity = match self.resolve_identity(transition).await? {
            Ok(identity) => identity,
            Err(result) => return Ok(result),
        };
        let signing_key = match self.check_key(&identity, transition) {
            Ok(key) => key,
            Err(result) => return Ok(result),
        };

        let result = validate_data_contract_structure(
            contract,
            &contract.owner_id,
            &create.entropy,
            self.config.max_unique_indices,
        );
        if !result.is_valid() {
            log_rejection("data_contract_structure", &result);
            return Ok(result);
        }

        if self.repository.fetch_data_contract(&contract.id).await?.is_some() {
            let result = rejected(StateError::DataContractAlreadyPresent {
                data_contract_id: contract.id,
            });
            log_rejection("data_contract_state", &result);
            return Ok(result);
        }

        let result = self.verify_signature(transition, signing_key)?;
        if !result.is_valid() {
            log_rejection("signature", &result);
        }
        Ok(result)
    }

    // =========================================================================
    // APPLY
    // =========================================================================

    /// Writes the effects of a validated transition, in batch order.
    #[instrument(
        skip(self, transition),
        fields(kind = %transition.kind(), owner_id = %transition.owner_id())
    )]
    pub async fn apply_transition(&self, transition: &StateTransition) -> Result<(), ValidatorError> {
        match transition {
            StateTransition::DataContractCreate(create) => {
                self.repository
                    .store_data_contract(create.data_contract.clone())
                    .await?;
                info!(data_contract_id = %create.data_contract.id, "data contract stored");
            }
            StateTransition::DocumentsBatch(batch) => {
                for document_transition in &batch.transitions {
                    self.apply_document_transition(document_transition, batch.owner_id)
                        .await?;
                }
                info!(documents = batch.transitions.len(), "documents batch applied");
            }
        }
        Ok(())
    }

    async fn apply_document_transition(
        &self,
        transition: &DocumentTransition,
        owner_id: Identifier,
    ) -> Result<(), ValidatorError> {
        match transition {
            DocumentTransition::Create { .. } => {
                if let Some(document) = Document::from_transition(transition, owner_id) {
                    self.repository.store_document(document).await?;
                }
            }
            DocumentTransition::Replace { .. } => {
                let existing = self.fetch_existing(transition).await?;
                if let Some(mut document) = Document::from_transition(transition, owner_id) {
                    document.created_at = existing.created_at;
                    self.repository.store_document(document).await?;
                }
            }
            DocumentTransition::Delete { base, .. } => {
                self.repository
                    .remove_document(&base.data_contract_id, &base.document_type, &base.id)
                    .await?;
            }
        }
        debug!(action = %transition.action(), document_id = %transition.id(), "document applied");
        Ok(())
    }

    async fn fetch_existing(&self, transition: &DocumentTransition) -> Result<Document, ValidatorError> {
        let query = DocumentQuery::new(vec![WhereClause::equal("$id", transition.id().to_hex())]);
        self.repository
            .fetch_documents(&transition.data_contract_id(), transition.document_type(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or(ValidatorError::MissingDocument(transition.id()))
    }
}

/// Phase 2 per-document checks: the type is defined by its contract and a
/// create's id is the derived one.
fn check_document_types(
    transitions: &[DocumentTransition],
    owner_id: &Identifier,
    contracts: &HashMap<Identifier, DataContract>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for transition in transitions {
        let data_contract_id = transition.data_contract_id();
        let defined = contracts
            .get(&data_contract_id)
            .is_some_and(|contract| contract.is_document_defined(transition.document_type()));
        if !defined {
            result.add_error(BasicError::InvalidDocumentType {
                document_type: transition.document_type().to_string(),
                data_contract_id,
            });
            continue;
        }

        if let DocumentTransition::Create { entropy, .. } = transition {
            let expected = generate_document_id(
                &data_contract_id,
                owner_id,
                transition.document_type(),
                entropy,
            );
            if expected != transition.id() {
                result.add_error(BasicError::InvalidDocumentTransitionId {
                    expected,
                    actual: transition.id(),
                });
            }
        }
    }
    result
}

#[async_trait]
impl<R, S> StateTransitionValidationApi for BatchValidator<R, S>
where
    R: StateRepository,
    S: Signer,
{
    async fn validate(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, ValidatorError> {
        self.validate_transition(transition).await
    }

    async fn apply(&self, transition: &StateTransition) -> Result<(), ValidatorError> {
        self.apply_transition(transition).await
    }
}
