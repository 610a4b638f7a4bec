//! Unified error system for Simweave
//!
//! Every operation of the component core reports failures through [`SimError`].
//! Failures are synchronous and never leave partial state behind: a returned
//! error means the project looks exactly as it did before the call.

use serde::{Deserialize, Serialize};

/// Unified error type for all Simweave operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SimError {
    /// Unknown handle, shape-invalid input or a rejected graph edit
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message describing the invalid input
        message: String,
    },

    /// Item, slot or identifier is already present
    #[error("Duplicate insertion: {message}")]
    DuplicateInsertion {
        /// Error message describing the duplicate
        message: String,
    },

    /// Acting role lacks the privilege required for the operation
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Error message describing the missing privilege
        message: String,
    },

    /// Operation is not allowed in the current state
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        /// Error message describing why the operation is unsupported
        message: String,
    },

    /// Audit timestamp would break the write → supervize → release chain
    #[error("Invalid ordering: {message}")]
    InvalidOrdering {
        /// Error message describing the ordering violation
        message: String,
    },

    /// Index or lookup target does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration failure
        message: String,
    },
}

/// Coarse classification of a [`SimError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`SimError::InvalidArgument`]
    InvalidArgument,
    /// See [`SimError::DuplicateInsertion`]
    DuplicateInsertion,
    /// See [`SimError::AccessDenied`]
    AccessDenied,
    /// See [`SimError::UnsupportedOperation`]
    UnsupportedOperation,
    /// See [`SimError::InvalidOrdering`]
    InvalidOrdering,
    /// See [`SimError::NotFound`]
    NotFound,
    /// See [`SimError::Config`]
    Config,
}

impl SimError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a duplicate insertion error
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::DuplicateInsertion {
            message: message.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Create an invalid ordering error
    pub fn invalid_ordering(message: impl Into<String>) -> Self {
        Self::InvalidOrdering {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::DuplicateInsertion { .. } => ErrorKind::DuplicateInsertion,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::InvalidOrdering { .. } => ErrorKind::InvalidOrdering,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Whether this is an access denied error
    pub fn is_access_denied(&self) -> bool {
        self.kind() == ErrorKind::AccessDenied
    }
}

/// Standard Result type for Simweave operations
pub type Result<T> = std::result::Result<T, SimError>;

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::config(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}
