//! Unified error handling for the eggshop crate
//!
//! Each module keeps its own error enum. [`Error`] wraps them so callers that
//! cross module boundaries can work with a single type, and [`ErrorCategory`]
//! groups failures by how they should be handled.
//!
//! # Usage
//!
//! ```rust
//! use eggshop::error::{Error, ErrorCategory};
//! use eggshop::shop::ShopError;
//!
//! let err: Error = ShopError::corrupt_state("shop.json", "expected value").into();
//! assert_eq!(err.category(), ErrorCategory::State);
//! assert!(err.is_recoverable());
//! ```

use std::io;
use thiserror::Error;

pub use crate::catalog::CatalogError;
pub use crate::notifications::ChannelError;
pub use crate::shop::ShopError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad weights, shop size, interval or catalog rows
    Input,
    /// Persisted state that cannot be read back
    State,
    /// Filesystem errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// HTTP and chat API errors
    Network,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "invalid input",
            Self::State => "corrupt state",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Network => "network error",
            Self::Other => "other error",
        }
    }

    /// Process exit code for a command that failed with this category
    ///
    /// Bad input and bad configuration exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input | Self::Config => 2,
            _ => 1,
        }
    }
}

/// Unified error type for the eggshop crate
#[derive(Error, Debug)]
pub enum Error {
    /// Shop generation and state errors
    #[error("Shop error: {0}")]
    Shop(#[from] ShopError),

    /// Egg catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Chat delivery errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if this error is recoverable (can be retried or worked around)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Shop(e) => e.is_recoverable(),
            Self::Catalog(_) => false,
            Self::Channel(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Shop(e) => match e {
                ShopError::InvalidInput { .. } => ErrorCategory::Input,
                ShopError::CorruptState { .. } => ErrorCategory::State,
                ShopError::Io { .. } => ErrorCategory::Storage,
                ShopError::Serialization(_) => ErrorCategory::State,
            },
            Self::Catalog(e) => match e {
                CatalogError::Io { .. } => ErrorCategory::Storage,
                _ => ErrorCategory::Input,
            },
            Self::Channel(e) => match e {
                ChannelError::InvalidConfig(_) => ErrorCategory::Config,
                ChannelError::HttpError(_) | ChannelError::Rejected { .. } => {
                    ErrorCategory::Network
                }
                ChannelError::Other(_) => ErrorCategory::Other,
            },
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::State,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other(context.into())
    }

    /// Wrap a configuration failure reported through `anyhow`
    pub fn from_config(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
