//! # Domain Entities
//!
//! Documents, data contracts and identities as this subsystem sees them.
//!
//! Document fields are a flat property map; nested objects are explicit
//! `serde_json::Value::Object` values, read (never written) through
//! [`Document::get_property`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::transitions::DocumentTransition;
use super::value_objects::{
    Identifier, IndexDirection, KeyPurpose, KeyType, SecurityLevel, TimestampMillis,
};

/// Application-defined document fields, ordered by name.
pub type DocumentData = BTreeMap<String, Value>;

// =============================================================================
// DOCUMENT
// =============================================================================

/// A committed (or prospective) document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Derived from `(data_contract_id, owner_id, document_type, entropy)`.
    pub id: Identifier,
    /// Document type within the contract.
    pub document_type: String,
    /// Owning data contract.
    pub data_contract_id: Identifier,
    /// Owning identity.
    pub owner_id: Identifier,
    /// Starts at [`Document::INITIAL_REVISION`], +1 per replace.
    pub revision: u64,
    /// Creation time, if the contract tracks it.
    pub created_at: Option<TimestampMillis>,
    /// Last update time, if the contract tracks it.
    pub updated_at: Option<TimestampMillis>,
    /// Application-defined fields.
    pub data: DocumentData,
}

impl Document {
    /// Revision of a freshly created document.
    pub const INITIAL_REVISION: u64 = 1;

    /// Builds the document a create or replace transition would store.
    ///
    /// Returns `None` for delete transitions.
    #[must_use]
    pub fn from_transition(transition: &DocumentTransition, owner_id: Identifier) -> Option<Self> {
        let base = transition.base();
        let (revision, created_at, updated_at, data) = match transition {
            DocumentTransition::Create {
                created_at,
                updated_at,
                data,
                ..
            } => (Self::INITIAL_REVISION, *created_at, *updated_at, data.clone()),
            DocumentTransition::Replace {
                revision,
                updated_at,
                data,
                ..
            } => (*revision, None, *updated_at, data.clone()),
            DocumentTransition::Delete { .. } => return None,
        };

        Some(Self {
            id: base.id,
            document_type: base.document_type.clone(),
            data_contract_id: base.data_contract_id,
            owner_id,
            revision,
            created_at,
            updated_at,
            data,
        })
    }

    /// Reads a property by name.
    ///
    /// `$`-prefixed names address system fields (`$id`, `$ownerId`,
    /// `$dataContractId`, `$type`, `$revision`, `$createdAt`, `$updatedAt`);
    /// identifiers are returned hex-encoded. Other names address top-level keys
    /// of `data`; nested objects are returned whole. A `null` reads as absent.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "$id" => Some(Value::String(self.id.to_hex())),
            "$ownerId" => Some(Value::String(self.owner_id.to_hex())),
            "$dataContractId" => Some(Value::String(self.data_contract_id.to_hex())),
            "$type" => Some(Value::String(self.document_type.clone())),
            "$revision" => Some(Value::from(self.revision)),
            "$createdAt" => self.created_at.map(Value::from),
            "$updatedAt" => self.updated_at.map(Value::from),
            _ => self.data.get(name).filter(|value| !value.is_null()).cloned(),
        }
    }

    /// Reads a string property.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

// =============================================================================
// DATA CONTRACT
// =============================================================================

/// One property of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexProperty {
    /// Property name (system `$` names allowed).
    pub name: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: IndexDirection,
}

impl IndexProperty {
    /// Ascending property.
    #[must_use]
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: IndexDirection::Asc,
        }
    }

    /// Descending property.
    #[must_use]
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: IndexDirection::Desc,
        }
    }
}

/// An index declared on a document type. Property order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, unique within the document type.
    pub name: String,
    /// Ordered properties.
    pub properties: Vec<IndexProperty>,
    /// Whether the combined property values must be unique.
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    /// Property names in declaration order.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }
}

/// Schema and indices of one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentTypeDefinition {
    /// JSON schema of the document data, validated upstream.
    #[serde(default)]
    pub schema: Value,
    /// Declared indices, in declaration order.
    #[serde(default)]
    pub indices: Vec<IndexDefinition>,
}

impl DocumentTypeDefinition {
    /// Unique indices in declaration order.
    pub fn unique_indices(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indices.iter().filter(|index| index.unique)
    }
}

/// A published schema governing an application's document types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContract {
    /// Derived from `(owner_id, entropy)`.
    pub id: Identifier,
    /// Identity that published the contract.
    pub owner_id: Identifier,
    /// Document types by name.
    pub documents: BTreeMap<String, DocumentTypeDefinition>,
}

impl DataContract {
    /// Looks up a document type.
    #[must_use]
    pub fn document_type(&self, name: &str) -> Option<&DocumentTypeDefinition> {
        self.documents.get(name)
    }

    /// Whether the contract defines `name`.
    #[must_use]
    pub fn is_document_defined(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// A public key registered on an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPublicKey {
    /// Key id, unique within the identity.
    pub id: u32,
    /// Key algorithm.
    pub key_type: KeyType,
    /// Allowed usage.
    pub purpose: KeyPurpose,
    /// Security level.
    pub security_level: SecurityLevel,
    /// Encoded key bytes.
    pub data: Vec<u8>,
    /// Set once the key is disabled.
    pub disabled_at: Option<TimestampMillis>,
}

/// An identity acting on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity id.
    pub id: Identifier,
    /// Credit balance.
    pub balance: u64,
    /// Identity revision.
    pub revision: u64,
    /// Registered keys.
    pub public_keys: Vec<IdentityPublicKey>,
}

impl Identity {
    /// Finds a key by id.
    #[must_use]
    pub fn get_public_key_by_id(&self, key_id: u32) -> Option<&IdentityPublicKey> {
        self.public_keys.iter().find(|key| key.id == key_id)
    }
}
