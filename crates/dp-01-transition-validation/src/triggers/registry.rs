//! Trigger registry and the system-contract bindings it is built from.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::contact_request::ContactRequestTrigger;
use super::domain::CreateDomainTrigger;
use super::reject::RejectTrigger;
use super::DataTrigger;
use crate::domain::value_objects::{DocumentAction, Identifier};

/// Name-service document type holding registered names.
pub const DOMAIN_DOCUMENT_TYPE: &str = "domain";

/// Name-service document type holding salted name reservations.
pub const PREORDER_DOCUMENT_TYPE: &str = "preorder";

/// Contacts document type holding contact requests.
pub const CONTACT_REQUEST_DOCUMENT_TYPE: &str = "contactRequest";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Name-service contract binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameServiceTriggerConfig {
    /// Name-service data contract.
    pub contract_id: Identifier,
    /// Only identity allowed to register top-level domains.
    pub top_level_identity: Identifier,
}

/// Contacts contract binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsTriggerConfig {
    /// Contacts data contract.
    pub contract_id: Identifier,
}

/// System contracts that get built-in triggers. Absent entries register
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTriggerConfig {
    /// Name-service contract.
    pub name_service: Option<NameServiceTriggerConfig>,
    /// Contacts contract.
    pub contacts: Option<ContactsTriggerConfig>,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Every trigger binding of the process, in registration order.
#[derive(Debug, Clone, Default)]
pub struct DataTriggerRegistry {
    triggers: Vec<DataTrigger>,
}

impl DataTriggerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in triggers of the configured system contracts.
    #[must_use]
    pub fn from_config(config: &DataTriggerConfig) -> Self {
        let mut registry = Self::new();

        if let Some(name_service) = &config.name_service {
            let contract_id = name_service.contract_id;
            registry.register(DataTrigger::new(
                contract_id,
                DOMAIN_DOCUMENT_TYPE,
                DocumentAction::Create,
                Arc::new(CreateDomainTrigger),
                Some(name_service.top_level_identity),
            ));
            for document_type in [DOMAIN_DOCUMENT_TYPE, PREORDER_DOCUMENT_TYPE] {
                for action in [DocumentAction::Replace, DocumentAction::Delete] {
                    registry.register(DataTrigger::new(
                        contract_id,
                        document_type,
                        action,
                        Arc::new(RejectTrigger::new(action)),
                        Some(name_service.top_level_identity),
                    ));
                }
            }
        }

        if let Some(contacts) = &config.contacts {
            registry.register(DataTrigger::new(
                contacts.contract_id,
                CONTACT_REQUEST_DOCUMENT_TYPE,
                DocumentAction::Create,
                Arc::new(ContactRequestTrigger),
                None,
            ));
        }

        registry
    }

    /// Adds a binding after the existing ones.
    pub fn register(&mut self, trigger: DataTrigger) {
        self.triggers.push(trigger);
    }

    /// Every binding for the exact tuple, in registration order.
    #[must_use]
    pub fn get_triggers_for(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        action: DocumentAction,
    ) -> Vec<&DataTrigger> {
        self.triggers
            .iter()
            .filter(|trigger| trigger.is_matching(data_contract_id, document_type, action))
            .collect()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
