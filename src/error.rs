use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a per-resource failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider API rejected or failed the call
    ApiError,
    /// The resource (or a sub-resource) does not exist
    NotFound,
    /// A bounded wait elapsed before the resource converged
    Timeout,
    /// The requested transition is not valid from the observed state
    ValidationError,
    /// No handler is registered for the resource type
    HandlerNotFound,
    /// The resource was not processed because an earlier priority group failed
    Skipped,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::HandlerNotFound => "HANDLER_NOT_FOUND",
            ErrorKind::Skipped => "SKIPPED",
        };
        f.write_str(name)
    }
}

/// Failure surfaced by a provider call.
///
/// `Display` renders the provider message exactly as received so it can be
/// reported without decoration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LightsOutError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("No handler registered for resource type '{resource_type}'")]
    HandlerNotFound { resource_type: String },

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl LightsOutError {
    /// Kind used when this error is recorded against a single resource.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LightsOutError::Provider(e) => e.kind,
            LightsOutError::HandlerNotFound { .. } => ErrorKind::HandlerNotFound,
            LightsOutError::Configuration(_) => ErrorKind::ValidationError,
            LightsOutError::Discovery(_) | LightsOutError::Notification(_) => ErrorKind::ApiError,
        }
    }
}

pub type Result<T> = std::result::Result<T, LightsOutError>;
