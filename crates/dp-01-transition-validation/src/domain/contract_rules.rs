//! Structural checks on a data contract being published.

use std::collections::HashSet;

use super::entities::DataContract;
use super::services::generate_data_contract_id;
use super::validation_result::ValidationResult;
use super::value_objects::Identifier;
use crate::errors::BasicError;

/// Checks the contract id derivation and the index declarations of every
/// document type. All findings are collected.
///
/// Per document type, at most `max_unique_indices` indices may be unique and
/// no two indices may cover the same ordered property list.
#[must_use]
pub fn validate_data_contract_structure(
    contract: &DataContract,
    owner_id: &Identifier,
    entropy: &[u8; 32],
    max_unique_indices: usize,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    let expected = generate_data_contract_id(owner_id, entropy);
    if contract.id != expected {
        result.add_error(BasicError::InvalidDataContractId {
            expected,
            actual: contract.id,
        });
    }

    for (document_type, definition) in &contract.documents {
        if definition.unique_indices().count() > max_unique_indices {
            result.add_error(BasicError::UniqueIndicesLimitReached {
                document_type: document_type.clone(),
                limit: max_unique_indices,
            });
        }

        let mut seen = HashSet::new();
        for index in &definition.indices {
            if !seen.insert(index.property_names()) {
                result.add_error(BasicError::DuplicateIndex {
                    document_type: document_type.clone(),
                    index_name: index.name.clone(),
                });
            }
        }
    }

    result
}
