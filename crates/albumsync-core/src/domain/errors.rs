//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! such as directory entries without a usable name.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A directory entry name could not be represented as UTF-8
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// A path has no final component (e.g. `/` or `..`)
    #[error("Path has no file name: {0}")]
    MissingFileName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::MissingFileName("/".to_string());
        assert_eq!(err.to_string(), "Path has no file name: /");

        let err = DomainError::InvalidFileName("\u{fffd}.JPG".to_string());
        assert_eq!(err.to_string(), "Invalid file name: \u{fffd}.JPG");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidFileName("x".to_string());
        let err2 = DomainError::InvalidFileName("x".to_string());
        let err3 = DomainError::InvalidFileName("y".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
