//! Contact request creation: the declared core height must be recent.

use async_trait::async_trait;

use super::{condition_error, execution_error, DataTriggerExecutionContext, DataTriggerFunction};
use crate::domain::transitions::DocumentTransition;
use crate::domain::validation_result::ValidationResult;
use crate::domain::value_objects::Identifier;
use crate::errors::StateRepositoryError;

/// Accepted distance, in core blocks, from the chain-locked height.
pub const CORE_HEIGHT_WINDOW: u64 = 5;

/// Field holding the core height the request was created at.
pub const CORE_HEIGHT_FIELD: &str = "coreHeightCreatedAt";

/// Checks `coreHeightCreatedAt` against the latest chain-locked height.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactRequestTrigger;

#[async_trait]
impl DataTriggerFunction for ContactRequestTrigger {
    fn name(&self) -> &'static str {
        "create_contact_request"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerExecutionContext<'_>,
        _top_level_identity: Option<&Identifier>,
    ) -> Result<ValidationResult, StateRepositoryError> {
        let Some(value) = transition.data().and_then(|data| data.get(CORE_HEIGHT_FIELD)) else {
            return Ok(ValidationResult::new());
        };
        let Some(core_height) = value.as_u64() else {
            return Ok(execution_error(
                transition,
                format!("{CORE_HEIGHT_FIELD} must be an unsigned integer, got {value}"),
            )
            .into());
        };

        let Some(header) = context.latest_block_header else {
            return Ok(execution_error(transition, "Latest platform block header is unknown").into());
        };

        let locked = header.core_chain_locked_height;
        let start = locked.saturating_sub(CORE_HEIGHT_WINDOW);
        let end = locked.saturating_add(CORE_HEIGHT_WINDOW);

        if (start..=end).contains(&core_height) {
            Ok(ValidationResult::new())
        } else {
            Ok(condition_error(
                transition,
                format!("Core height {core_height} is out of block height window from {start} to {end}"),
            )
            .into())
        }
    }
}
