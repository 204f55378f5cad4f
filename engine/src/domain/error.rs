//! Error taxonomy for the analysis core
//!
//! Only malformed input and arithmetic overflow are errors. Too-few-samples,
//! zero-cost and single-point series resolve to sentinel values instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A field failed a domain check
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Derive-based request validation failed
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    /// Exact decimal arithmetic overflowed
    #[error("Arithmetic overflow: {0}")]
    Arithmetic(String),
}

impl AnalysisError {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an arithmetic overflow error for an operation
    pub fn overflow(operation: &str) -> Self {
        Self::Arithmetic(format!("decimal overflow in {}", operation))
    }

    /// Whether the input itself was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = AnalysisError::validation("weights", "must sum to a positive value");
        assert_eq!(
            err.to_string(),
            "Invalid weights: must sum to a positive value"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_overflow_is_not_validation() {
        let err = AnalysisError::overflow("total_cost");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("total_cost"));
    }
}
