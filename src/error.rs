//! Error types shared by every engine component
//!
//! All failures are validation failures: the engine is deterministic, so a
//! computation either produces a result or rejects its inputs up front.
//! Mathematically undefined metrics (IRR without a sign change) are not errors
//! and are returned as `None` by the solver instead.

use thiserror::Error;

/// Broad classification of an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Out-of-range or inconsistent input
    Validation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unsupported payment frequency: {0}")]
    InvalidFrequency(String),

    #[error("unsupported rate type: {0}")]
    InvalidRateType(String),

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("invalid forecast assumptions: {0}")]
    InvalidAssumptions(String),

    #[error("payment number {requested} is outside the schedule (1..={len})")]
    InvalidPaymentNumber { requested: u32, len: usize },

    #[error("property has neither a current market value nor a purchase price")]
    MissingPropertyValue,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
