//! # Document Queries
//!
//! Conjunctive `where` filters passed to the state repository. Property
//! names follow [`Document::get_property`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entities::Document;

/// Comparison of one where clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhereOperator {
    /// Property equals the value.
    Equal,
    /// Property equals one element of the value array.
    In,
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// Property name.
    pub property: String,
    /// Comparison.
    pub operator: WhereOperator,
    /// Operand; an array for [`WhereOperator::In`].
    pub value: Value,
}

impl WhereClause {
    /// `property == value`.
    #[must_use]
    pub fn equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            operator: WhereOperator::Equal,
            value: value.into(),
        }
    }

    /// `property in values`.
    #[must_use]
    pub fn within(property: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            property: property.into(),
            operator: WhereOperator::In,
            value: Value::Array(values),
        }
    }

    /// Whether `document` satisfies this clause.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        let Some(actual) = document.get_property(&self.property) else {
            return false;
        };
        match self.operator {
            WhereOperator::Equal => actual == self.value,
            WhereOperator::In => self
                .value
                .as_array()
                .is_some_and(|values| values.contains(&actual)),
        }
    }
}

/// All clauses must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentQuery {
    /// Conjunctive filters.
    pub where_clauses: Vec<WhereClause>,
}

impl DocumentQuery {
    /// Query with the given clauses.
    #[must_use]
    pub fn new(where_clauses: Vec<WhereClause>) -> Self {
        Self { where_clauses }
    }

    /// Whether `document` satisfies every clause.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.where_clauses.iter().all(|clause| clause.matches(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DocumentData;
    use serde_json::json;
    use shared_types::Identifier;

    fn document(email: &str) -> Document {
        let mut data = DocumentData::new();
        data.insert("email".into(), json!(email));
        Document {
            id: Identifier::new([1; 32]),
            document_type: "profile".into(),
            data_contract_id: Identifier::new([2; 32]),
            owner_id: Identifier::new([3; 32]),
            revision: 1,
            created_at: None,
            updated_at: None,
            data,
        }
    }

    #[test]
    fn test_equal_and_in() {
        let doc = document("a@example.com");
        assert!(WhereClause::equal("email", "a@example.com").matches(&doc));
        assert!(!WhereClause::equal("email", "b@example.com").matches(&doc));
        assert!(WhereClause::within("email", vec![json!("x"), json!("a@example.com")]).matches(&doc));
        assert!(!WhereClause::within("email", vec![]).matches(&doc));
    }

    #[test]
    fn test_missing_property_never_matches() {
        let doc = document("a@example.com");
        assert!(!WhereClause::equal("phone", Value::Null).matches(&doc));
    }

    #[test]
    fn test_query_is_conjunctive() {
        let doc = document("a@example.com");
        let owner = Identifier::new([3; 32]).to_hex();
        let query = DocumentQuery::new(vec![
            WhereClause::equal("$ownerId", owner),
            WhereClause::equal("email", "a@example.com"),
        ]);
        assert!(query.matches(&doc));
        assert!(DocumentQuery::default().matches(&doc));

        let query = DocumentQuery::new(vec![
            WhereClause::equal("$ownerId", "other"),
            WhereClause::equal("email", "a@example.com"),
        ]);
        assert!(!query.matches(&doc));
    }
}
