//! # Duplicate Detection
//!
//! Two independent duplicate classes are checked on every batch:
//!
//! 1. **By identifier**: transitions of the batch sharing `(type, id)`.
//! 2. **By unique index**: documents sharing the composite key of a unique
//!    index, either inside the batch or against committed state.
//!
//! Findings are reported per document type (first appearance in the batch),
//! then per unique index in declaration order, then in batch order. Under one
//! index the in-batch findings come first, followed by the collisions with
//! committed state. [`plan_unique_index_checks`] yields one
//! [`UniqueIndexCheck`] per index carrying its in-batch findings and its
//! repository lookup, so the caller can run the queries concurrently and
//! still merge with [`match_committed_duplicates`] in this fixed order.

use serde_json::Value;
use std::collections::HashMap;

use super::entities::{DataContract, Document, IndexDefinition};
use super::query::{DocumentQuery, WhereClause};
use super::transitions::DocumentTransition;
use super::validation_result::ValidationResult;
use super::value_objects::Identifier;
use crate::errors::{BasicError, DocumentReference, StateError};

// =============================================================================
// COMPOSITE KEYS
// =============================================================================

/// Composite key of a document under one index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Every property is set: `name:value` pairs in index order.
    Complete(String),
    /// Some, but not all, properties are set.
    Partial,
    /// No property is set; the index does not apply.
    Empty,
}

/// Computes the composite key of `document` under `index`.
#[must_use]
pub fn index_key(document: &Document, index: &IndexDefinition) -> IndexKey {
    let mut parts = Vec::with_capacity(index.properties.len());
    let mut missing = 0usize;

    for property in &index.properties {
        match document.get_property(&property.name) {
            Some(value) => parts.push(format!("{}:{}", property.name, value)),
            None => missing += 1,
        }
    }

    if missing == 0 {
        IndexKey::Complete(parts.join(","))
    } else if missing == index.properties.len() {
        IndexKey::Empty
    } else {
        IndexKey::Partial
    }
}

fn reference(document_type: &str, document_id: Identifier) -> DocumentReference {
    DocumentReference {
        document_type: document_type.to_string(),
        document_id,
    }
}

/// Groups items by key, keeping groups in first-appearance order and members
/// in input order.
fn group_in_order<K, T>(items: impl IntoIterator<Item = (K, T)>) -> Vec<Vec<T>>
where
    K: std::hash::Hash + Eq,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();
    for (key, item) in items {
        let slot = *positions.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }
    groups
}

// =============================================================================
// DUPLICATES BY IDENTIFIER
// =============================================================================

/// Reports every group of transitions sharing `(type, id)`.
#[must_use]
pub fn find_duplicates_by_id(transitions: &[DocumentTransition]) -> ValidationResult {
    let groups = group_in_order(transitions.iter().map(|transition| {
        (
            (transition.document_type(), transition.id()),
            reference(transition.document_type(), transition.id()),
        )
    }));

    let mut result = ValidationResult::new();
    for references in groups.into_iter().filter(|group| group.len() > 1) {
        result.add_error(BasicError::DuplicateDocumentTransitionsWithIds { references });
    }
    result
}

// =============================================================================
// DUPLICATES BY UNIQUE INDEX (INSIDE THE BATCH)
// =============================================================================

/// Documents of one `(contract, type)` the batch would store, in batch order.
struct TypeGroup<'a> {
    data_contract: &'a DataContract,
    document_type: String,
    documents: Vec<Document>,
}

fn prospective_documents_by_type<'a>(
    transitions: &[DocumentTransition],
    owner_id: Identifier,
    contracts: &'a HashMap<Identifier, DataContract>,
) -> Vec<TypeGroup<'a>> {
    let grouped = group_in_order(transitions.iter().filter_map(|transition| {
        let document = Document::from_transition(transition, owner_id)?;
        Some(((document.data_contract_id, document.document_type.clone()), document))
    }));

    grouped
        .into_iter()
        .filter_map(|documents| {
            let first = documents.first()?;
            let data_contract = contracts.get(&first.data_contract_id)?;
            Some(TypeGroup {
                data_contract,
                document_type: first.document_type.clone(),
                documents,
            })
        })
        .collect()
}

/// Reports partially populated compound indices and every group of batch
/// documents sharing a unique composite key.
///
/// Transition types missing from their contract are skipped; they were
/// rejected when the contract was resolved.
#[must_use]
pub fn find_duplicates_by_indices(
    transitions: &[DocumentTransition],
    owner_id: Identifier,
    contracts: &HashMap<Identifier, DataContract>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for check in plan_unique_index_checks(transitions, owner_id, contracts) {
        result.merge(check.in_batch);
    }
    result
}

fn in_batch_findings(
    document_type: &str,
    index: &IndexDefinition,
    keyed: &[(IndexKey, Document)],
    partial: usize,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for _ in 0..partial {
        result.add_error(BasicError::InconsistentCompoundIndexData {
            document_type: document_type.to_string(),
            index_properties: index.property_names(),
        });
    }

    let collisions = group_in_order(
        keyed
            .iter()
            .map(|(key, document)| (key, reference(&document.document_type, document.id))),
    );
    for references in collisions.into_iter().filter(|refs| refs.len() > 1) {
        result.add_error(BasicError::DuplicateDocumentTransitionsWithIndices {
            references,
            index: index.clone(),
        });
    }
    result
}

// =============================================================================
// DUPLICATES BY UNIQUE INDEX (AGAINST COMMITTED STATE)
// =============================================================================

/// One repository lookup covering every batch document of a type under one
/// unique index.
#[derive(Debug, Clone)]
pub struct UniqueIndexLookup {
    /// Contract of the document type.
    pub data_contract_id: Identifier,
    /// Document type.
    pub document_type: String,
    /// The unique index.
    pub index: IndexDefinition,
    /// `property in [values...]` for every index property.
    pub query: DocumentQuery,
    /// Batch documents with a complete key, in batch order.
    pub candidates: Vec<(IndexKey, Document)>,
}

/// Everything checked for one unique index of one document type.
///
/// Callers report `in_batch` first, then the committed collisions found
/// through `lookup`, before moving on to the next check.
#[derive(Debug, Clone)]
pub struct UniqueIndexCheck {
    /// Partial compound keys and in-batch collisions under this index.
    pub in_batch: ValidationResult,
    /// Committed-state lookup; `None` when no batch document has a complete key.
    pub lookup: Option<UniqueIndexLookup>,
}

/// Plans one check per unique index per document type, in reporting order.
#[must_use]
pub fn plan_unique_index_checks(
    transitions: &[DocumentTransition],
    owner_id: Identifier,
    contracts: &HashMap<Identifier, DataContract>,
) -> Vec<UniqueIndexCheck> {
    let mut checks = Vec::new();

    for group in prospective_documents_by_type(transitions, owner_id, contracts) {
        let Some(definition) = group.data_contract.document_type(&group.document_type) else {
            continue;
        };

        for index in definition.unique_indices() {
            let mut candidates: Vec<(IndexKey, Document)> = Vec::new();
            let mut partial = 0usize;
            for document in &group.documents {
                match index_key(document, index) {
                    key @ IndexKey::Complete(_) => candidates.push((key, document.clone())),
                    IndexKey::Partial => partial += 1,
                    IndexKey::Empty => {}
                }
            }

            let in_batch = in_batch_findings(&group.document_type, index, &candidates, partial);
            let lookup = (!candidates.is_empty()).then(|| UniqueIndexLookup {
                data_contract_id: group.data_contract.id,
                document_type: group.document_type.clone(),
                index: index.clone(),
                query: committed_key_query(index, &candidates),
                candidates,
            });
            checks.push(UniqueIndexCheck { in_batch, lookup });
        }
    }

    checks
}

/// Plans one lookup per unique index per document type, in reporting order.
///
/// Indices with no fully populated candidate need no lookup and are left out.
#[must_use]
pub fn plan_unique_index_lookups(
    transitions: &[DocumentTransition],
    owner_id: Identifier,
    contracts: &HashMap<Identifier, DataContract>,
) -> Vec<UniqueIndexLookup> {
    plan_unique_index_checks(transitions, owner_id, contracts)
        .into_iter()
        .filter_map(|check| check.lookup)
        .collect()
}

fn committed_key_query(
    index: &IndexDefinition,
    candidates: &[(IndexKey, Document)],
) -> DocumentQuery {
    let where_clauses = index
        .properties
        .iter()
        .map(|property| {
            let mut values: Vec<Value> = Vec::new();
            for (_, document) in candidates {
                if let Some(value) = document.get_property(&property.name) {
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
            }
            WhereClause::within(property.name.clone(), values)
        })
        .collect();
    DocumentQuery::new(where_clauses)
}

/// Reports every candidate whose composite key is held by a committed
/// document with a different id.
#[must_use]
pub fn match_committed_duplicates(
    lookup: &UniqueIndexLookup,
    committed: &[Document],
) -> ValidationResult {
    let committed_keys: Vec<(IndexKey, Identifier)> = committed
        .iter()
        .map(|document| (index_key(document, &lookup.index), document.id))
        .collect();

    let mut result = ValidationResult::new();
    for (key, candidate) in &lookup.candidates {
        let collides = committed_keys
            .iter()
            .any(|(committed_key, committed_id)| committed_key == key && *committed_id != candidate.id);
        if collides {
            result.add_error(StateError::DuplicateUniqueIndex {
                document_id: candidate.id,
                index: lookup.index.clone(),
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DocumentData, DocumentTypeDefinition, IndexProperty};
    use crate::domain::transitions::DocumentTransitionBase;
    use crate::errors::ConsensusError;
    use serde_json::json;
    use std::collections::BTreeMap;

    const CONTRACT: Identifier = Identifier::new([1; 32]);
    const OWNER: Identifier = Identifier::new([2; 32]);

    fn email_index() -> IndexDefinition {
        IndexDefinition {
            name: "ownerEmail".into(),
            properties: vec![IndexProperty::asc("$ownerId"), IndexProperty::asc("email")],
            unique: true,
        }
    }

    fn contracts() -> HashMap<Identifier, DataContract> {
        let mut documents = BTreeMap::new();
        documents.insert(
            "profile".to_string(),
            DocumentTypeDefinition {
                schema: Value::Null,
                indices: vec![
                    email_index(),
                    IndexDefinition {
                        name: "handle".into(),
                        properties: vec![IndexProperty::asc("handle")],
                        unique: true,
                    },
                ],
            },
        );
        let contract = DataContract {
            id: CONTRACT,
            owner_id: OWNER,
            documents,
        };
        HashMap::from([(CONTRACT, contract)])
    }

    fn create(byte: u8, fields: &[(&str, Value)]) -> DocumentTransition {
        let data: DocumentData = fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        DocumentTransition::Create {
            base: DocumentTransitionBase {
                id: Identifier::new([byte; 32]),
                document_type: "profile".into(),
                data_contract_id: CONTRACT,
            },
            entropy: [byte; 32],
            created_at: None,
            updated_at: None,
            data,
        }
    }

    fn ids(error: &ConsensusError) -> Vec<Identifier> {
        match error {
            ConsensusError::Basic(BasicError::DuplicateDocumentTransitionsWithIds { references })
            | ConsensusError::Basic(BasicError::DuplicateDocumentTransitionsWithIndices {
                references,
                ..
            }) => references.iter().map(|r| r.document_id).collect(),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_report_every_member() {
        let a = create(5, &[]);
        let b = create(6, &[]);
        let transitions = vec![a.clone(), b, a.clone(), a];
        let result = find_duplicates_by_id(&transitions);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(ids(&result.errors()[0]), vec![Identifier::new([5; 32]); 3]);
    }

    #[test]
    fn test_same_id_different_type_is_not_duplicate() {
        let a = create(5, &[]);
        let mut b = a.clone();
        if let DocumentTransition::Create { base, .. } = &mut b {
            base.document_type = "other".into();
        }
        assert!(find_duplicates_by_id(&[a, b]).is_valid());
    }

    #[test]
    fn test_index_duplicates_preserve_index_definition() {
        let transitions = vec![
            create(1, &[("email", json!("w@example.com"))]),
            create(2, &[("email", json!("w@example.com"))]),
        ];
        let result = find_duplicates_by_indices(&transitions, OWNER, &contracts());
        assert_eq!(result.errors().len(), 1);
        match &result.errors()[0] {
            ConsensusError::Basic(BasicError::DuplicateDocumentTransitionsWithIndices {
                references,
                index,
            }) => {
                assert_eq!(index, &email_index());
                assert_eq!(index.property_names(), vec!["$ownerId", "email"]);
                assert_eq!(references.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_index_duplicates_follow_declaration_order() {
        let transitions = vec![
            create(1, &[("handle", json!("h")), ("email", json!("x@example.com"))]),
            create(2, &[("handle", json!("h")), ("email", json!("x@example.com"))]),
        ];
        let result = find_duplicates_by_indices(&transitions, OWNER, &contracts());
        let names: Vec<_> = result
            .errors()
            .iter()
            .map(|e| match e {
                ConsensusError::Basic(BasicError::DuplicateDocumentTransitionsWithIndices {
                    index,
                    ..
                }) => index.name.clone(),
                other => panic!("unexpected error: {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["ownerEmail", "handle"]);
    }

    #[test]
    fn test_different_values_do_not_collide() {
        let transitions = vec![
            create(1, &[("email", json!("a@example.com"))]),
            create(2, &[("email", json!("b@example.com"))]),
        ];
        assert!(find_duplicates_by_indices(&transitions, OWNER, &contracts()).is_valid());
    }

    #[test]
    fn test_index_key_states() {
        let index = IndexDefinition {
            name: "pair".into(),
            properties: vec![IndexProperty::asc("a"), IndexProperty::asc("b")],
            unique: true,
        };
        let doc = |fields: &[(&str, Value)]| {
            Document::from_transition(&create(1, fields), OWNER).unwrap()
        };
        assert_eq!(index_key(&doc(&[]), &index), IndexKey::Empty);
        assert_eq!(index_key(&doc(&[("a", json!(1))]), &index), IndexKey::Partial);
        assert_eq!(
            index_key(&doc(&[("a", json!(1)), ("b", json!("x"))]), &index),
            IndexKey::Complete("a:1,b:\"x\"".into())
        );
    }

    #[test]
    fn test_partial_compound_index_is_inconsistent() {
        let mut contracts = contracts();
        if let Some(contract) = contracts.get_mut(&CONTRACT) {
            contract.documents.insert(
                "pair".into(),
                DocumentTypeDefinition {
                    schema: Value::Null,
                    indices: vec![IndexDefinition {
                        name: "ab".into(),
                        properties: vec![IndexProperty::asc("a"), IndexProperty::asc("b")],
                        unique: true,
                    }],
                },
            );
        }
        let mut transition = create(1, &[("a", json!(1))]);
        if let DocumentTransition::Create { base, .. } = &mut transition {
            base.document_type = "pair".into();
        }
        let result = find_duplicates_by_indices(&[transition], OWNER, &contracts);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].code(), 1021);
    }

    #[test]
    fn test_plan_one_lookup_per_unique_index() {
        let transitions = vec![
            create(1, &[("email", json!("a@example.com")), ("handle", json!("a"))]),
            create(2, &[("email", json!("b@example.com"))]),
            create(3, &[("email", json!("a@example.com"))]),
        ];
        let lookups = plan_unique_index_lookups(&transitions, OWNER, &contracts());
        assert_eq!(lookups.len(), 2);

        let email = &lookups[0];
        assert_eq!(email.index.name, "ownerEmail");
        assert_eq!(email.candidates.len(), 3);
        assert_eq!(
            email.query.where_clauses[1],
            WhereClause::within("email", vec![json!("a@example.com"), json!("b@example.com")])
        );

        let handle = &lookups[1];
        assert_eq!(handle.index.name, "handle");
        assert_eq!(handle.candidates.len(), 1);
    }

    #[test]
    fn test_checks_keep_in_batch_findings_with_their_index() {
        let transitions = vec![
            create(1, &[("email", json!("taken@example.com")), ("handle", json!("h"))]),
            create(2, &[("email", json!("free@example.com")), ("handle", json!("h"))]),
        ];
        let checks = plan_unique_index_checks(&transitions, OWNER, &contracts());
        assert_eq!(checks.len(), 2);

        assert!(checks[0].in_batch.is_valid());
        let email = checks[0].lookup.as_ref().unwrap();
        assert_eq!(email.index, email_index());

        assert_eq!(checks[1].in_batch.errors().len(), 1);
        assert_eq!(checks[1].in_batch.errors()[0].code(), 1020);
        assert_eq!(checks[1].lookup.as_ref().unwrap().index.name, "handle");
    }

    #[test]
    fn test_check_without_complete_keys_has_no_lookup() {
        let transitions = vec![create(1, &[("email", json!("a@example.com"))])];
        let checks = plan_unique_index_checks(&transitions, OWNER, &contracts());
        assert_eq!(checks.len(), 2);
        assert!(checks[0].lookup.is_some());
        assert!(checks[1].lookup.is_none());
        assert!(checks[1].in_batch.is_valid());
    }

    #[test]
    fn test_committed_duplicate_excludes_own_id() {
        let transitions = vec![
            create(1, &[("email", json!("a@example.com"))]),
            create(2, &[("email", json!("b@example.com"))]),
        ];
        let lookups = plan_unique_index_lookups(&transitions, OWNER, &contracts());
        let email = &lookups[0];

        let mut same_id = Document::from_transition(&transitions[0], OWNER).unwrap();
        same_id.revision = 1;
        assert!(match_committed_duplicates(email, &[same_id]).is_valid());

        let mut other = Document::from_transition(&transitions[1], OWNER).unwrap();
        other.id = Identifier::new([9; 32]);
        let result = match_committed_duplicates(email, &[other]);
        assert_eq!(
            result.errors(),
            &[StateError::DuplicateUniqueIndex {
                document_id: Identifier::new([2; 32]),
                index: email_index(),
            }
            .into()]
        );
    }
}
