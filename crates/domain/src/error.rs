//! Unified error types for the domain layer
//!
//! Most vault operations treat a lookup miss as a silent no-op, so this enum
//! only covers structural problems in data a caller hands us, such as a
//! malformed calendar definition. Dice formulas have their own
//! `DiceParseError`.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    /// Creates a validation error for broken domain invariants.
    ///
    /// # Example
    /// ```ignore
    /// if months.len() != 12 {
    ///     return Err(DomainError::validation("a calendar has exactly 12 months"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
