//! Domain error taxonomy
//!
//! Recoverable domain violations are distinct variants so callers can
//! react per class; unexpected store failures are collapsed into
//! [`DomainError::Infra`] and treated as fatal by the caller.

use thiserror::Error;

/// Errors surfaced by the order ledger and notification aggregator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Referenced order/item/product/table/notification does not exist (404-class)
    #[error("{0} not found")]
    NotFound(String),

    /// Mutation attempted while the order status forbids it (409-class)
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// Operation would break a structural invariant (422-class)
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed input, rejected before any mutation is attempted (400-class)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Store unreachable or misbehaving; propagates as fatal (500-class)
    #[error("infrastructure error: {0}")]
    Infra(String),
}

impl DomainError {
    /// Not-found error for a named resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// State-conflict error with a custom message
    pub fn state_conflict(msg: impl Into<String>) -> Self {
        Self::StateConflict(msg.into())
    }

    /// Invariant-violation error with a custom message
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Validation error with a custom message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Infrastructure error with a custom message
    pub fn infra(msg: impl Into<String>) -> Self {
        Self::Infra(msg.into())
    }

    /// True for domain violations the caller can recover from
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Infra(_))
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
