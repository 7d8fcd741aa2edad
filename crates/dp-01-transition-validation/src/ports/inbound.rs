//! # Driving Ports (API - Inbound)
//!
//! The public API of the transition validator, used by the block executor
//! and by the transition submission path.

use async_trait::async_trait;

use crate::domain::transitions::StateTransition;
use crate::domain::validation_result::ValidationResult;
use crate::errors::ValidatorError;

/// Validation and application of state transitions.
#[async_trait]
pub trait StateTransitionValidationApi: Send + Sync {
    /// Runs every validation phase against current state.
    ///
    /// Rejections are reported in the returned [`ValidationResult`];
    /// `Err` is reserved for faults (repository down, broken invariants).
    async fn validate(&self, transition: &StateTransition)
        -> Result<ValidationResult, ValidatorError>;

    /// Writes the effects of a transition that validated successfully.
    ///
    /// Calling this for a transition that did not validate is a caller bug.
    async fn apply(&self, transition: &StateTransition) -> Result<(), ValidatorError>;
}
