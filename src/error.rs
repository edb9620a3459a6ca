//! Error types for the vocal consensus pipeline

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Message shown to end users for every failed analysis.
///
/// Deliberately coarse: the detailed kind stays in logs.
pub const USER_FACING_FAILURE: &str = "The analysis engine stalled. This typically happens if the \
file is too complex or the network failed during the reasoning pass. Try a clean 15-30 second \
high-quality clip.";

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Analysis Failure Kinds
    // =============================

    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle response failed schema validation: {0}")]
    SchemaValidation(String),

    #[error("Samples cannot be aggregated: {0}")]
    AggregationPrecondition(String),

    // =============================
    // Setup Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The four classified failure kinds an analysis can end with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Timeout,
    SchemaValidation,
    AggregationPrecondition,
}

impl AnalysisError {
    /// Classify this error into one of the analysis failure kinds.
    ///
    /// Setup and library errors reaching the analysis path count as transport
    /// failures: they mean the oracle round-trip did not complete.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Timeout(_) => ErrorKind::Timeout,
            AnalysisError::SchemaValidation(_) | AnalysisError::SerializationError(_) => {
                ErrorKind::SchemaValidation
            }
            AnalysisError::AggregationPrecondition(_) => ErrorKind::AggregationPrecondition,
            AnalysisError::Transport(_)
            | AnalysisError::Config(_)
            | AnalysisError::InvalidInput(_)
            | AnalysisError::IoError(_) => ErrorKind::Transport,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::SchemaValidation => "schema_validation",
            ErrorKind::AggregationPrecondition => "aggregation_precondition",
        };
        write!(f, "{}", s)
    }
}

/// A failed analysis as seen by the presentation layer.
///
/// `Display` only ever yields [`USER_FACING_FAILURE`]; the classified kind and
/// the underlying error are kept for logging.
#[derive(Debug)]
pub struct AnalysisFailure {
    kind: ErrorKind,
    cause: AnalysisError,
}

impl AnalysisFailure {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn cause(&self) -> &AnalysisError {
        &self.cause
    }

    pub fn into_cause(self) -> AnalysisError {
        self.cause
    }
}

impl From<AnalysisError> for AnalysisFailure {
    fn from(cause: AnalysisError) -> Self {
        Self {
            kind: cause.kind(),
            cause,
        }
    }
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(USER_FACING_FAILURE)
    }
}

impl std::error::Error for AnalysisFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            AnalysisError::Transport("down".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            AnalysisError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            AnalysisError::SchemaValidation("missing verdict".into()).kind(),
            ErrorKind::SchemaValidation
        );
        assert_eq!(
            AnalysisError::AggregationPrecondition("metrics".into()).kind(),
            ErrorKind::AggregationPrecondition
        );
    }

    #[test]
    fn test_failure_hides_diagnostics() {
        let failure = AnalysisFailure::from(AnalysisError::Transport(
            "connection refused at 10.0.0.3:443".into(),
        ));

        assert_eq!(failure.kind(), ErrorKind::Transport);
        assert_eq!(failure.to_string(), USER_FACING_FAILURE);
        assert!(!failure.to_string().contains("10.0.0.3"));
        assert!(failure.cause().to_string().contains("10.0.0.3"));
    }
}
