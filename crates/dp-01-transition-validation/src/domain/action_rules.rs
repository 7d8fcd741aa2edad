//! # Document Action Rules
//!
//! Legality of each transition against previously committed state.
//!
//! | Action | Requires |
//! |--------|----------|
//! | Create | no committed document with the id |
//! | Replace / Delete | committed document exists, same owner, declared revision = committed + 1 |
//!
//! Checks for one document stop at the first failure (later checks need the
//! earlier facts). Checks across documents never stop early.

use std::collections::HashMap;

use super::entities::Document;
use super::transitions::DocumentTransition;
use super::validation_result::ValidationResult;
use super::value_objects::{Identifier, TimestampMillis};
use crate::errors::{ConsensusError, StateError};

/// Accepted range for document timestamps around the block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampWindow {
    /// Earliest accepted timestamp.
    pub start: TimestampMillis,
    /// Latest accepted timestamp.
    pub end: TimestampMillis,
}

impl TimestampWindow {
    /// Window of `block_time_ms ± window_ms`.
    #[must_use]
    pub fn around(block_time_ms: TimestampMillis, window_ms: u64) -> Self {
        Self {
            start: block_time_ms.saturating_sub(window_ms),
            end: block_time_ms.saturating_add(window_ms),
        }
    }

    /// Whether `timestamp` lies in the window (inclusive).
    #[must_use]
    pub fn contains(&self, timestamp: TimestampMillis) -> bool {
        (self.start..=self.end).contains(&timestamp)
    }

    fn check(
        &self,
        name: &str,
        document_id: Identifier,
        timestamp: Option<TimestampMillis>,
    ) -> Result<(), ConsensusError> {
        match timestamp {
            Some(timestamp) if !self.contains(timestamp) => {
                Err(StateError::DocumentTimestampWindowViolation {
                    timestamp_name: name.to_string(),
                    document_id,
                    timestamp,
                    time_window_start: self.start,
                    time_window_end: self.end,
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}

/// Checks one transition against the committed document with its id.
///
/// `window` is `None` when no block header is known; timestamp range checks
/// are skipped then.
pub fn check_action_against_state(
    transition: &DocumentTransition,
    owner_id: &Identifier,
    existing: Option<&Document>,
    window: Option<&TimestampWindow>,
) -> Result<(), ConsensusError> {
    let document_id = transition.id();

    match transition {
        DocumentTransition::Create {
            created_at,
            updated_at,
            ..
        } => {
            if existing.is_some() {
                return Err(StateError::DocumentAlreadyPresent { document_id }.into());
            }
            if let (Some(created), Some(updated)) = (created_at, updated_at) {
                if created != updated {
                    return Err(StateError::DocumentTimestampsMismatch { document_id }.into());
                }
            }
            if let Some(window) = window {
                window.check("createdAt", document_id, *created_at)?;
                window.check("updatedAt", document_id, *updated_at)?;
            }
            Ok(())
        }
        DocumentTransition::Replace {
            revision,
            updated_at,
            ..
        } => {
            check_existing(document_id, owner_id, *revision, existing)?;
            if let Some(window) = window {
                window.check("updatedAt", document_id, *updated_at)?;
            }
            Ok(())
        }
        DocumentTransition::Delete { revision, .. } => {
            check_existing(document_id, owner_id, *revision, existing)
        }
    }
}

fn check_existing(
    document_id: Identifier,
    owner_id: &Identifier,
    revision: u64,
    existing: Option<&Document>,
) -> Result<(), ConsensusError> {
    let existing = existing.ok_or(StateError::DocumentNotFound { document_id })?;

    if existing.owner_id != *owner_id {
        return Err(StateError::DocumentOwnerIdMismatch {
            document_id,
            document_owner_id: *owner_id,
            existing_document_owner_id: existing.owner_id,
        }
        .into());
    }

    if existing.revision.checked_add(1) != Some(revision) {
        return Err(StateError::InvalidDocumentRevision {
            document_id,
            current_revision: existing.revision,
            attempted_revision: revision,
        }
        .into());
    }

    Ok(())
}

/// Checks every transition in batch order and collects every violation.
#[must_use]
pub fn validate_actions_against_state(
    transitions: &[DocumentTransition],
    owner_id: &Identifier,
    committed: &HashMap<Identifier, Document>,
    window: Option<&TimestampWindow>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for transition in transitions {
        let existing = committed.get(&transition.id());
        if let Err(error) = check_action_against_state(transition, owner_id, existing, window) {
            result.add_error(error);
        }
    }
    result
}
