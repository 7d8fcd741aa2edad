//! Unconditional rejection, for records that are immutable once created.

use async_trait::async_trait;

use super::{condition_error, DataTriggerExecutionContext, DataTriggerFunction};
use crate::domain::transitions::DocumentTransition;
use crate::domain::validation_result::ValidationResult;
use crate::domain::value_objects::{DocumentAction, Identifier};
use crate::errors::StateRepositoryError;

/// Rejects every transition it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectTrigger {
    message: String,
}

impl RejectTrigger {
    /// Rejection of `action`.
    #[must_use]
    pub fn new(action: DocumentAction) -> Self {
        let verb = match action {
            DocumentAction::Create => "Create",
            DocumentAction::Replace => "Update",
            DocumentAction::Delete => "Delete",
        };
        Self {
            message: format!("{verb} action is not allowed"),
        }
    }

    /// The rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[async_trait]
impl DataTriggerFunction for RejectTrigger {
    fn name(&self) -> &'static str {
        "reject"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        _context: &DataTriggerExecutionContext<'_>,
        _top_level_identity: Option<&Identifier>,
    ) -> Result<ValidationResult, StateRepositoryError> {
        Ok(condition_error(transition, self.message.clone()).into())
    }
}
