//! # Error Types
//!
//! Errors raised while parsing shared primitives.

use thiserror::Error;

/// Errors that can occur when building an [`Identifier`](crate::Identifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input is not valid hex.
    #[error("Invalid identifier encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded bytes have the wrong length.
    #[error("Invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
