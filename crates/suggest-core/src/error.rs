//! Error types for the suggest engine.
//!
//! A single error enum is shared by every component. Errors are `Clone`
//! because a rejected [`Deferred`](crate::deferred::Deferred) hands the same
//! error to every observer.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for suggest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed, shareable underlying cause of a backend failure.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in suggest operations.
///
/// Error codes follow the pattern `SUGGEST-XXX`.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Malformed request parameters, raised before any I/O (SUGGEST-001).
    #[error("[SUGGEST-001] Invalid request: {0}")]
    Validation(String),

    /// Backend store failure (SUGGEST-002).
    #[error("[SUGGEST-002] Backend error: {message}")]
    Backend {
        /// Description of the failed operation.
        message: String,
        /// Underlying cause reported by the backend, if any.
        #[source]
        source: Option<Cause>,
    },

    /// Waiting on a deferred result timed out (SUGGEST-003).
    #[error("[SUGGEST-003] Timed out after {0:?}")]
    Timeout(Duration),

    /// The operation was cancelled before it completed (SUGGEST-004).
    #[error("[SUGGEST-004] Operation cancelled")]
    Cancelled,

    /// Reading conversion or normalization failure (SUGGEST-005).
    #[error("[SUGGEST-005] Conversion error: {0}")]
    Conversion(String),

    /// Configuration error (SUGGEST-006).
    #[error("[SUGGEST-006] Configuration error: {0}")]
    Config(String),

    /// Serialization error (SUGGEST-007).
    #[error("[SUGGEST-007] Serialization error: {0}")]
    Serialization(String),

    /// Internal error (SUGGEST-008).
    ///
    /// Indicates an unexpected internal error such as a worker thread panic.
    #[error("[SUGGEST-008] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a backend error without an underlying cause.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend error wrapping the original cause.
    pub fn backend_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: message.into(),
            source: Some(Arc::new(cause)),
        }
    }

    /// Returns the error code (e.g., "SUGGEST-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "SUGGEST-001",
            Self::Backend { .. } => "SUGGEST-002",
            Self::Timeout(_) => "SUGGEST-003",
            Self::Cancelled => "SUGGEST-004",
            Self::Conversion(_) => "SUGGEST-005",
            Self::Config(_) => "SUGGEST-006",
            Self::Serialization(_) => "SUGGEST-007",
            Self::Internal(_) => "SUGGEST-008",
        }
    }

    /// Returns true for request validation errors.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error is a wait timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns true if retrying the operation may succeed.
    ///
    /// Validation, configuration and internal errors are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
