//! # Integration Tests
//!
//! End-to-end flows: contract creation, document lifecycles and the
//! built-in data triggers, driven through `BatchValidator` against the
//! in-memory repository.

pub mod flows;
