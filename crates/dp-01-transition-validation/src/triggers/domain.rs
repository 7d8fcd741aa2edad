//! # Name-Service Domain Creation
//!
//! A `domain` document registers `normalizedLabel` under
//! `normalizedParentDomainName` (empty for top-level domains). Creation is
//! accepted only if:
//!
//! 1. `nameHash` is a double-SHA-256 multihash of the full normalized name;
//! 2. `normalizedLabel` is the lowercase form of `label`;
//! 3. `records.identity`, when set, is the owner and resolves;
//! 4. a top-level domain is owned by the top-level identity, any other
//!    domain has a registered parent;
//! 5. a `preorder` with `saltedDomainHash = multihash(preorderSalt ++ nameHash)`
//!    exists;
//! 6. no other domain holds the label under the same parent.
//!
//! A malformed `nameHash` stops the checks; every other failure is reported
//! and checking continues.

use async_trait::async_trait;
use serde_json::Value;

use super::registry::{DOMAIN_DOCUMENT_TYPE, PREORDER_DOCUMENT_TYPE};
use super::{condition_error, execution_error, DataTriggerExecutionContext, DataTriggerFunction};
use crate::domain::entities::Document;
use crate::domain::query::{DocumentQuery, WhereClause};
use crate::domain::services::{multihash_sha256d_hex, parse_multihash_hex};
use crate::domain::transitions::DocumentTransition;
use crate::domain::validation_result::ValidationResult;
use crate::domain::value_objects::Identifier;
use crate::errors::StateRepositoryError;

/// Display label.
pub const LABEL_FIELD: &str = "label";
/// Lowercase label.
pub const NORMALIZED_LABEL_FIELD: &str = "normalizedLabel";
/// Full normalized name of the parent, empty for top-level domains.
pub const PARENT_DOMAIN_FIELD: &str = "normalizedParentDomainName";
/// Hex multihash of the full normalized name.
pub const NAME_HASH_FIELD: &str = "nameHash";
/// Hex salt used by the preorder.
pub const PREORDER_SALT_FIELD: &str = "preorderSalt";
/// Object of the records the name resolves to.
pub const RECORDS_FIELD: &str = "records";
/// Key inside [`RECORDS_FIELD`] naming the identity the name resolves to.
pub const RECORDS_IDENTITY_KEY: &str = "identity";
/// Preorder field holding the salted hash.
pub const SALTED_DOMAIN_HASH_FIELD: &str = "saltedDomainHash";

/// Full normalized name: `label` or `label.parent`.
#[must_use]
pub fn full_domain_name(normalized_label: &str, normalized_parent: &str) -> String {
    if normalized_parent.is_empty() {
        normalized_label.to_string()
    } else {
        format!("{normalized_label}.{normalized_parent}")
    }
}

/// Hex multihash stored in `nameHash` for a full normalized name.
#[must_use]
pub fn domain_name_hash(full_name: &str) -> String {
    multihash_sha256d_hex(full_name.as_bytes())
}

/// Hex multihash stored in a preorder's `saltedDomainHash`.
#[must_use]
pub fn salted_domain_hash(salt: &[u8], name_hash: &[u8]) -> String {
    let mut buf = Vec::with_capacity(salt.len() + name_hash.len());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(name_hash);
    multihash_sha256d_hex(&buf)
}

/// Validates name registrations on the name-service contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDomainTrigger;

#[async_trait]
impl DataTriggerFunction for CreateDomainTrigger {
    fn name(&self) -> &'static str {
        "create_domain"
    }

    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerExecutionContext<'_>,
        top_level_identity: Option<&Identifier>,
    ) -> Result<ValidationResult, StateRepositoryError> {
        let Some(document) = Document::from_transition(transition, context.owner_id) else {
            return Ok(execution_error(transition, "Domain trigger requires document data").into());
        };

        let mut result = ValidationResult::new();

        let fields = (
            document.get_str(LABEL_FIELD),
            document.get_str(NORMALIZED_LABEL_FIELD),
            document.get_str(NAME_HASH_FIELD),
        );
        let (Some(label), Some(normalized_label), Some(name_hash)) = fields else {
            return Ok(execution_error(
                transition,
                "Domain document requires label, normalizedLabel and nameHash",
            )
            .into());
        };
        let parent = document.get_str(PARENT_DOMAIN_FIELD).unwrap_or_default();

        if parse_multihash_hex(name_hash).is_none() {
            result.add_error(condition_error(transition, "Invalid hash format"));
            return Ok(result);
        }

        let full_name = full_domain_name(normalized_label, parent);
        if domain_name_hash(&full_name) != name_hash {
            result.add_error(condition_error(
                transition,
                "Document hash doesn't match actual hash",
            ));
        }

        if normalized_label != label.to_lowercase() {
            result.add_error(condition_error(
                transition,
                "Normalized label doesn't match label",
            ));
        }

        let records_identity = document
            .data
            .get(RECORDS_FIELD)
            .and_then(Value::as_object)
            .and_then(|records| records.get(RECORDS_IDENTITY_KEY))
            .filter(|value| !value.is_null());
        if let Some(records_identity) = records_identity {
            check_records_identity(transition, context, records_identity, &mut result).await?;
        }

        if parent.is_empty() {
            if top_level_identity != Some(&context.owner_id) {
                result.add_error(condition_error(
                    transition,
                    "Can't create top level domain for this identity",
                ));
            }
        } else {
            let parents = context
                .state_repository
                .fetch_documents(
                    &context.data_contract.id,
                    DOMAIN_DOCUMENT_TYPE,
                    &DocumentQuery::new(vec![WhereClause::equal(
                        NAME_HASH_FIELD,
                        domain_name_hash(parent),
                    )]),
                )
                .await?;
            if parents.is_empty() {
                result.add_error(condition_error(transition, "Parent domain is not present"));
            }
        }

        match document.get_str(PREORDER_SALT_FIELD).map(hex::decode) {
            Some(Ok(salt)) => {
                // checked above to be valid hex
                let name_hash_bytes = hex::decode(name_hash).unwrap_or_default();
                let preorders = context
                    .state_repository
                    .fetch_documents(
                        &context.data_contract.id,
                        PREORDER_DOCUMENT_TYPE,
                        &DocumentQuery::new(vec![WhereClause::equal(
                            SALTED_DOMAIN_HASH_FIELD,
                            salted_domain_hash(&salt, &name_hash_bytes),
                        )]),
                    )
                    .await?;
                if preorders.is_empty() {
                    result.add_error(condition_error(transition, "preorderDocument was not found"));
                }
            }
            Some(Err(_)) | None => {
                result.add_error(condition_error(
                    transition,
                    "preorderSalt is missing or not valid hex",
                ));
            }
        }

        let siblings = context
            .state_repository
            .fetch_documents(
                &context.data_contract.id,
                DOMAIN_DOCUMENT_TYPE,
                &DocumentQuery::new(vec![
                    WhereClause::equal(PARENT_DOMAIN_FIELD, parent),
                    WhereClause::equal(NORMALIZED_LABEL_FIELD, normalized_label),
                ]),
            )
            .await?;
        if siblings.iter().any(|sibling| sibling.id != document.id) {
            result.add_error(condition_error(
                transition,
                format!("Domain label {normalized_label} is not unique under its parent"),
            ));
        }

        Ok(result)
    }
}

async fn check_records_identity(
    transition: &DocumentTransition,
    context: &DataTriggerExecutionContext<'_>,
    records_identity: &Value,
    result: &mut ValidationResult,
) -> Result<(), StateRepositoryError> {
    let Some(identity_id) = records_identity
        .as_str()
        .and_then(|encoded| Identifier::from_hex(encoded).ok())
    else {
        result.add_error(condition_error(
            transition,
            "records.identity is not a valid identifier",
        ));
        return Ok(());
    };

    if identity_id != context.owner_id {
        result.add_error(condition_error(
            transition,
            format!(
                "ownerId {} doesn't match records.identity {identity_id}",
                context.owner_id
            ),
        ));
    }

    if context
        .state_repository
        .fetch_identity(&identity_id)
        .await?
        .is_none()
    {
        result.add_error(condition_error(
            transition,
            format!("Identity {identity_id} referenced in records.identity not found"),
        ));
    }

    Ok(())
}
