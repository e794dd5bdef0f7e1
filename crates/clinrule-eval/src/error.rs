//! Evaluation errors for the rule engine

use clinrule_model::SourceError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while loading rules or analyzing patients
///
/// "No data" and "no match" are not errors: they surface as an explicit result state
/// and as `None` respectively.
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// Rule resource does not exist
    #[error("Rule resource not found: {path}")]
    ResourceNotFound { path: String },

    /// Rule resource exists but could not be read
    #[error("Failed to read rule resource {path}: {message}")]
    ResourceIo { path: String, message: String },

    /// Rule resource is not a well-formed rule definition
    #[error("Failed to parse rule resource {path}: {message}")]
    Parse { path: String, message: String },

    /// Unknown compound rule name
    #[error("Undefined compound rule: {name}")]
    UndefinedRule { name: String },

    /// Invalid engine configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Abstraction or data-access failure
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),
}

impl EvalError {
    /// Create a resource-not-found error
    pub fn resource_not_found(path: impl Into<String>) -> Self {
        Self::ResourceNotFound { path: path.into() }
    }

    /// Create a resource read error
    pub fn resource_io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an undefined rule error
    pub fn undefined_rule(name: impl Into<String>) -> Self {
        Self::UndefinedRule { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
