//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic validation or invariant failure. None of
/// them are transient, so callers surface them instead of retrying. An
/// operation that returns one of these has not changed any record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A role name outside the known set (`staff`, `manager`, `admin`).
    #[error("invalid role: '{0}'")]
    InvalidRole(String),

    /// A price or commission rate outside its allowed range.
    #[error("invalid commission input: {0}")]
    InvalidCommissionInput(String),

    /// A deal stage change that the pipeline does not allow.
    #[error("illegal transition from '{from}' to '{to}'")]
    IllegalTransition { from: String, to: String },

    /// A deal cannot be closed before its final price is recorded.
    #[error("deal {deal_id} has no final price")]
    MissingFinalPrice { deal_id: u64 },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A conflict with existing state (duplicate key, referenced record).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor is not permitted to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_role(name: impl Into<String>) -> Self {
        Self::InvalidRole(name.into())
    }

    pub fn invalid_commission(msg: impl Into<String>) -> Self {
        Self::InvalidCommissionInput(msg.into())
    }

    pub fn illegal_transition(from: impl core::fmt::Display, to: impl core::fmt::Display) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether the error should be rendered as a 404-equivalent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = DomainError::illegal_transition("closed", "negotiation");
        assert_eq!(err.to_string(), "illegal transition from 'closed' to 'negotiation'");

        let err = DomainError::not_found("deal", 42u64);
        assert_eq!(err.to_string(), "deal 42 not found");
        assert!(err.is_not_found());

        let err = DomainError::invalid_role("owner");
        assert_eq!(err.to_string(), "invalid role: 'owner'");
    }
}
