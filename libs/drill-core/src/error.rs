//! Error types for drill-core.

use thiserror::Error;

/// Result type alias using DrillError.
pub type Result<T> = std::result::Result<T, DrillError>;

/// Errors raised while validating scheduler input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrillError {
    #[error("invalid rating: {0:?} (expected again, hard, good or easy)")]
    InvalidRating(String),

    #[error("invalid state code: {0:?}")]
    InvalidStateCode(String),
}
