//! Error types for the shop module

use thiserror::Error;

/// Result type for shop operations
pub type ShopResult<T> = Result<T, ShopError>;

/// Shop-specific errors
#[derive(Error, Debug)]
pub enum ShopError {
    /// Weight table, shop size or interval cannot produce a valid shop
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Persisted state exists but cannot be interpreted
    #[error("Corrupt shop state in '{path}': {reason}")]
    CorruptState { path: String, reason: String },

    /// State file could not be read or written
    #[error("IO error during '{operation}': {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// State could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShopError {
    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a corrupt state error
    pub fn corrupt_state(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error with context
    pub fn io_error(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Corrupt state is handled locally by starting over; everything else aborts the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorruptState { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_error() {
        let err = ShopError::invalid_input("weight table is empty");
        assert!(err.to_string().contains("weight table is empty"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_corrupt_state_is_recoverable() {
        let err = ShopError::corrupt_state("shop.json", "missing field `generated_at`");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("shop.json"));
    }

    #[test]
    fn test_io_error_keeps_operation() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ShopError::io_error("write state", io);
        assert!(err.to_string().contains("write state"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: ShopError = json_err.into();
        assert!(matches!(err, ShopError::Serialization(_)));
    }
}
