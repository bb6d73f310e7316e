//! Error types for the sharpdrop library.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for detection operations.
pub type Result<T> = std::result::Result<T, DropError>;

/// Errors that can occur while screening a series for a drop.
///
/// A series without a change point or without a qualifying edge is not an
/// error; detectors report it as a negative [`DropResult`](crate::detection::DropResult).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DropError {
    /// Malformed input data (non-positive counts, non-monotonic times, NaN).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Series shorter than the algorithm minimum.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Times and values have different lengths.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A field required by a pipeline node is absent from the record.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Node configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Segmentation search exceeded its time budget.
    #[error("segmentation search timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl DropError {
    /// Whether this error signals a caller/data contract violation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DropError::InvalidInput(_)
                | DropError::InsufficientData { .. }
                | DropError::DimensionMismatch { .. }
                | DropError::MissingField(_)
        )
    }
}

impl From<serde_json::Error> for DropError {
    fn from(err: serde_json::Error) -> Self {
        DropError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = DropError::InvalidInput("counts must be positive".to_string());
        assert_eq!(err.to_string(), "invalid input: counts must be positive");

        let err = DropError::InsufficientData { needed: 3, got: 2 };
        assert_eq!(err.to_string(), "insufficient data: need at least 3, got 2");

        let err = DropError::DimensionMismatch {
            expected: 10,
            got: 9,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 10, got 9");

        let err = DropError::MissingField("t_bins".to_string());
        assert_eq!(err.to_string(), "missing field: t_bins");
    }

    #[test]
    fn invalid_input_family() {
        assert!(DropError::InvalidInput(String::new()).is_invalid_input());
        assert!(DropError::InsufficientData { needed: 3, got: 1 }.is_invalid_input());
        assert!(!DropError::Timeout {
            elapsed: Duration::from_millis(5)
        }
        .is_invalid_input());
        assert!(!DropError::InvalidParameter(String::new()).is_invalid_input());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = DropError::InvalidParameter("penalty".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
