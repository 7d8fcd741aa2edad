//! # Validation Result
//!
//! Ordered, non-short-circuiting accumulator of consensus errors. Insertion
//! order is part of the verdict: every node must report the same errors in
//! the same order, so errors are only ever appended.

use crate::errors::ConsensusError;

/// Accumulated consensus errors plus an optional success payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult<T = ()> {
    errors: Vec<ConsensusError>,
    data: Option<T>,
}

impl<T> Default for ValidationResult<T> {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            data: None,
        }
    }
}

impl<T> ValidationResult<T> {
    /// Empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Result holding the given errors.
    #[must_use]
    pub fn with_errors(errors: Vec<ConsensusError>) -> Self {
        Self { errors, data: None }
    }

    /// Appends one error.
    pub fn add_error(&mut self, error: impl Into<ConsensusError>) {
        self.errors.push(error.into());
    }

    /// Appends errors in iteration order.
    pub fn add_errors<E: Into<ConsensusError>>(&mut self, errors: impl IntoIterator<Item = E>) {
        self.errors.extend(errors.into_iter().map(Into::into));
    }

    /// Appends every error of `other`, preserving its order. `other`'s data
    /// is discarded.
    pub fn merge<U>(&mut self, other: ValidationResult<U>) {
        self.errors.extend(other.errors);
    }

    /// Builder form of [`merge`](Self::merge).
    #[must_use]
    pub fn merged<U>(mut self, other: ValidationResult<U>) -> Self {
        self.merge(other);
        self
    }

    /// True iff no error was added.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in insertion order.
    #[must_use]
    pub fn errors(&self) -> &[ConsensusError] {
        &self.errors
    }

    /// First error, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&ConsensusError> {
        self.errors.first()
    }

    /// Consumes the result, returning its errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<ConsensusError> {
        self.errors
    }

    /// Stores the success payload.
    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    /// Success payload. Meaningful only when [`is_valid`](Self::is_valid).
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Payload of a valid result, or the errors of an invalid one.
    pub fn into_data(self) -> Result<Option<T>, Vec<ConsensusError>> {
        if self.errors.is_empty() {
            Ok(self.data)
        } else {
            Err(self.errors)
        }
    }

    /// Same errors, payload dropped.
    #[must_use]
    pub fn without_data<U>(self) -> ValidationResult<U> {
        ValidationResult::with_errors(self.errors)
    }
}

impl<T> From<ConsensusError> for ValidationResult<T> {
    fn from(error: ConsensusError) -> Self {
        Self::with_errors(vec![error])
    }
}
