//! # Shared Types Crate
//!
//! Primitives used across the document platform crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and digests are defined once here.
//! - **Deterministic Derivation**: every derived identifier goes through
//!   [`hashing::sha256d`], so all nodes compute the same bytes.

pub mod entities;
pub mod errors;
pub mod hashing;

pub use entities::*;
pub use errors::*;
pub use hashing::*;
