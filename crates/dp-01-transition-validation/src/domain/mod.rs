//! # Domain Layer (Inner Hexagon)
//!
//! Pure validation logic for document state transitions.
//! NO I/O, NO async.
//!
//! - `value_objects`, `entities`, `transitions`: the data model.
//! - `validation_result`: the ordered error accumulator.
//! - `action_rules`: create/replace/delete legality against committed state.
//! - `key_rules`, `contract_rules`: signing key and contract structure checks.
//! - `duplicates`: duplicate detection by id and by unique index.
//! - `query`: repository where-filters.
//! - `services`: id derivation and multihash helpers.

pub mod action_rules;
pub mod contract_rules;
pub mod duplicates;
pub mod entities;
pub mod key_rules;
pub mod query;
pub mod services;
pub mod transitions;
pub mod validation_result;
pub mod value_objects;

pub use action_rules::*;
pub use contract_rules::*;
pub use duplicates::*;
pub use entities::*;
pub use key_rules::*;
pub use query::*;
pub use services::*;
pub use transitions::*;
pub use validation_result::*;
pub use value_objects::*;
