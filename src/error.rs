//! Error types for request-level failures.
//!
//! Row-level problems in a billing export never surface here: the normalizer
//! substitutes defaults instead. Only failures that make a whole request
//! impossible (missing object, unreadable CSV, store I/O) become a
//! [`BillingError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No object stored under the requested key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Key that cannot be mapped onto a storage location
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("No file name given")]
    EmptyFilename,

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BillingError::NotFound("march.csv".to_string());
        assert_eq!(error.to_string(), "Object not found: march.csv");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BillingError = io_error.into();
        assert!(matches!(err, BillingError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }
}
