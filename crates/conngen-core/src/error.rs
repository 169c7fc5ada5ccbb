// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error kinds for the connection generator protocol.

Errors are `Clone` so a generator can retain the fault that terminated an
iteration pass and report it again through `last_fault()`.
*/

/// Result type for connection generator operations
pub type ConnGenResult<T> = Result<T, ConnGenError>;

/// Errors that can occur while building, partitioning or iterating a generator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnGenError {
    /// The description engine could not be located or initialized
    #[error("Connectivity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Connection generator not properly initialized: no partitioned view installed")]
    Uninitialized,

    #[error("Must call start() before next()")]
    NotStarted,

    /// A payload slot held something other than a floating-point value
    #[error("Non-numeric value in payload slot {slot}: found {found}")]
    TypeMismatch { slot: usize, found: String },

    /// Error signaled by the underlying description engine
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid interval set: {0}")]
    InvalidIntervals(String),

    #[error("Invalid partition index {local} for {count} masks")]
    InvalidPartition { local: usize, count: usize },

    /// Partitioning scheme that is empty, overlapping or not space-covering
    #[error("Invalid partitioning scheme: {0}")]
    InvalidScheme(String),

    #[error("Value buffer holds {actual} slots but generator arity is {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Unknown connectivity library: {0}")]
    UnknownLibrary(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ConnGenError {
    /// True for faults raised while a pass was running, as opposed to protocol misuse
    pub fn is_iteration_fault(&self) -> bool {
        matches!(self, ConnGenError::Provider(_) | ConnGenError::TypeMismatch { .. })
    }
}

impl From<std::io::Error> for ConnGenError {
    fn from(err: std::io::Error) -> Self {
        ConnGenError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConnGenError::TypeMismatch {
            slot: 2,
            found: "text".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Non-numeric value in payload slot 2: found text"
        );
        assert_eq!(
            ConnGenError::NotStarted.to_string(),
            "Must call start() before next()"
        );
    }

    #[test]
    fn test_iteration_fault_classification() {
        assert!(ConnGenError::Provider("boom".into()).is_iteration_fault());
        assert!(!ConnGenError::NotStarted.is_iteration_fault());
        assert!(!ConnGenError::Uninitialized.is_iteration_fault());
    }
}
