//! Error types and result aliases for Quay operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Quay crates with actionable error messages. Registry failures
//! are split into the classes the lookup engine reacts to differently:
//! soft failures (`NotFound`, `Unauthorized`, `Timeout`, `ServerError`) and
//! the escalated `ServiceUnavailable`.

use thiserror::Error;

/// Unified error type for all Quay operations
#[derive(Error, Debug)]
pub enum QuayError {
    // Config errors
    #[error("Failed to parse quay.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse JSON document from {url}: {message}")]
    JsonParse { url: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Registry errors
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Access denied ({status}) for {url}")]
    Unauthorized { url: String, status: u16 },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Registry returned status {status} for {url}")]
    ServerError { url: String, status: u16 },

    #[error("Registry {host} is unavailable: {message}")]
    ServiceUnavailable { host: String, message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Cache errors
    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Quay operations
pub type QuayResult<T> = Result<T, QuayError>;

impl QuayError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a cache error from any error type
    pub fn cache<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Cache {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is transient
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QuayError::Network { .. }
                | QuayError::Timeout { .. }
                | QuayError::ServerError { .. }
                | QuayError::ServiceUnavailable { .. }
        )
    }

    /// Whether the caller should retry the whole operation later.
    ///
    /// Only the escalated default-registry failure is retryable at this
    /// layer; everything else already degraded to "no result".
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuayError::ServiceUnavailable { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            QuayError::NotFound { .. } => {
                Some("Check the package name spelling and the configured registry URLs")
            },
            QuayError::Unauthorized { .. } => {
                Some("Add credentials for this registry to the [[host-rules]] section of quay.toml")
            },
            QuayError::Network { .. } | QuayError::Timeout { .. } => {
                Some("Check your internet connection and try again")
            },
            QuayError::ServiceUnavailable { .. } => {
                Some("The default registry appears to be down, retry in a few minutes")
            },
            QuayError::TomlParse { .. } | QuayError::ConfigValidation { .. } => {
                Some("Fix the reported field in quay.toml or the matching QUAY_* variable")
            },
            _ => None,
        }
    }
}
