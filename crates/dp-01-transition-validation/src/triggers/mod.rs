//! # Data Triggers
//!
//! Contract-specific business rules that run after structural and state
//! checks pass. A trigger is bound to `(data contract, document type,
//! action)`; the [`DataTriggerRegistry`] returns every binding matching a
//! transition and [`execute_data_triggers`] runs them all.
//!
//! ## Ordering
//!
//! Trigger futures run concurrently, but results are merged strictly in
//! document-then-trigger order. No trigger result is dropped.

pub mod contact_request;
pub mod domain;
pub mod registry;
pub mod reject;

pub use contact_request::ContactRequestTrigger;
pub use domain::CreateDomainTrigger;
pub use registry::*;
pub use reject::RejectTrigger;

use async_trait::async_trait;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;

use crate::domain::entities::DataContract;
use crate::domain::transitions::DocumentTransition;
use crate::domain::validation_result::ValidationResult;
use crate::domain::value_objects::{BlockHeader, DocumentAction, Identifier};
use crate::errors::{ConsensusError, StateError, StateRepositoryError};
use crate::ports::outbound::StateRepository;

// =============================================================================
// EXECUTION CONTEXT
// =============================================================================

/// Read-only inputs shared by every trigger of one validation pass.
#[derive(Clone, Copy)]
pub struct DataTriggerExecutionContext<'a> {
    /// Repository for lookups.
    pub state_repository: &'a dyn StateRepository,
    /// Acting identity.
    pub owner_id: Identifier,
    /// Contract of the transition being checked.
    pub data_contract: &'a DataContract,
    /// Latest platform block header, if known.
    pub latest_block_header: Option<&'a BlockHeader>,
}

impl fmt::Debug for DataTriggerExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTriggerExecutionContext")
            .field("owner_id", &self.owner_id)
            .field("data_contract", &self.data_contract.id)
            .field("latest_block_header", &self.latest_block_header)
            .finish_non_exhaustive()
    }
}

/// `DataTriggerConditionError` for `transition`.
pub fn condition_error(transition: &DocumentTransition, message: impl Into<String>) -> ConsensusError {
    StateError::DataTriggerCondition {
        data_contract_id: transition.data_contract_id(),
        document_transition_id: transition.id(),
        message: message.into(),
    }
    .into()
}

/// `DataTriggerExecutionError` for `transition`.
pub fn execution_error(transition: &DocumentTransition, message: impl Into<String>) -> ConsensusError {
    StateError::DataTriggerExecution {
        data_contract_id: transition.data_contract_id(),
        document_transition_id: transition.id(),
        message: message.into(),
    }
    .into()
}

// =============================================================================
// TRIGGER FUNCTION
// =============================================================================

/// The rule a trigger runs.
///
/// Rule violations are returned as errors inside the [`ValidationResult`];
/// `Err` means the repository failed and no verdict can be reached.
#[async_trait]
pub trait DataTriggerFunction: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Checks `transition`. `top_level_identity` is the identity allowed to
    /// own top-level records of a system contract, if the binding has one.
    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerExecutionContext<'_>,
        top_level_identity: Option<&Identifier>,
    ) -> Result<ValidationResult, StateRepositoryError>;
}

/// A trigger function bound to `(contract, document type, action)`.
#[derive(Clone)]
pub struct DataTrigger {
    /// Bound contract.
    pub data_contract_id: Identifier,
    /// Bound document type.
    pub document_type: String,
    /// Bound action.
    pub action: DocumentAction,
    /// The rule.
    pub function: Arc<dyn DataTriggerFunction>,
    /// Owner of top-level records, passed to the rule.
    pub top_level_identity: Option<Identifier>,
}

impl fmt::Debug for DataTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTrigger")
            .field("data_contract_id", &self.data_contract_id)
            .field("document_type", &self.document_type)
            .field("action", &self.action)
            .field("function", &self.function.name())
            .field("top_level_identity", &self.top_level_identity)
            .finish()
    }
}

impl DataTrigger {
    /// Binds `function` to a `(contract, type, action)` tuple.
    pub fn new(
        data_contract_id: Identifier,
        document_type: impl Into<String>,
        action: DocumentAction,
        function: Arc<dyn DataTriggerFunction>,
        top_level_identity: Option<Identifier>,
    ) -> Self {
        Self {
            data_contract_id,
            document_type: document_type.into(),
            action,
            function,
            top_level_identity,
        }
    }

    /// Whether this trigger is bound to exactly this tuple.
    #[must_use]
    pub fn is_matching(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        action: DocumentAction,
    ) -> bool {
        self.data_contract_id == *data_contract_id
            && self.document_type == document_type
            && self.action == action
    }

    /// Runs the rule against `transition`.
    ///
    /// A transition that does not match the binding is reported as an
    /// execution error: it means dispatch went wrong.
    pub async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerExecutionContext<'_>,
    ) -> Result<ValidationResult, StateRepositoryError> {
        if transition.data_contract_id() != self.data_contract_id {
            return Ok(execution_error(
                transition,
                "Data contract of the document doesn't match the trigger",
            )
            .into());
        }
        if transition.document_type() != self.document_type {
            return Ok(execution_error(
                transition,
                "Document type doesn't match the trigger document type",
            )
            .into());
        }
        if transition.action() != self.action {
            return Ok(execution_error(
                transition,
                "Document action doesn't match the trigger action",
            )
            .into());
        }

        self.function
            .execute(transition, context, self.top_level_identity.as_ref())
            .await
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Runs every registered trigger for every transition.
///
/// `jobs` pairs each transition with the context of its contract, in batch
/// order. All trigger futures are joined before results are merged; a
/// repository failure in any of them fails the whole call.
pub async fn execute_data_triggers(
    registry: &DataTriggerRegistry,
    jobs: &[(&DocumentTransition, DataTriggerExecutionContext<'_>)],
) -> Result<ValidationResult, StateRepositoryError> {
    let mut futures = Vec::new();
    for (transition, context) in jobs {
        for trigger in registry.get_triggers_for(
            &transition.data_contract_id(),
            transition.document_type(),
            transition.action(),
        ) {
            tracing::trace!(
                trigger = trigger.function.name(),
                document_id = %transition.id(),
                "executing data trigger"
            );
            futures.push(trigger.execute(transition, context));
        }
    }

    let mut result = ValidationResult::new();
    for outcome in join_all(futures).await {
        result.merge(outcome?);
    }
    Ok(result)
}
