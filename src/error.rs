//! Error types for the grocery-impact crate.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, ImpactError>;

/// Errors that can occur while loading data, fitting models, or rendering
/// charts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImpactError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Year-ordering error in a series.
    #[error("year error: {0}")]
    YearError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical non-convergence).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Failure reading the input dataset.
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Chart rendering or export failure.
    #[error("chart write error: {0}")]
    PlotWrite(String),
}

impl From<std::io::Error> for ImpactError {
    fn from(err: std::io::Error) -> Self {
        ImpactError::Io(err.to_string())
    }
}

impl From<csv::Error> for ImpactError {
    fn from(err: csv::Error) -> Self {
        ImpactError::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ImpactError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ImpactError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 2, got 1");

        let err = ImpactError::InvalidParameter("horizon must be positive".to_string());
        assert_eq!(err.to_string(), "invalid parameter: horizon must be positive");

        let err = ImpactError::DimensionMismatch { expected: 4, got: 3 };
        assert_eq!(err.to_string(), "dimension mismatch: expected 4, got 3");

        let err = ImpactError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");

        let err = ImpactError::PlotWrite("permission denied".to_string());
        assert_eq!(err.to_string(), "chart write error: permission denied");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ImpactError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: ImpactError = io.into();
        assert!(matches!(err, ImpactError::Io(_)));
    }
}
