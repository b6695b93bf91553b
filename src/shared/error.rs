use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug)]
pub enum AppError {
    Network(String),
    NotFound(String),
    InvalidInput(String),
    ConfigurationError(String),
    SerializationError(String),
    DeserializationError(String),
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Network(_) => "network",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::ConfigurationError(_) => "configuration",
            AppError::SerializationError(_) => "serialization",
            AppError::DeserializationError(_) => "deserialization",
            AppError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DeserializationError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Http { status: 404, body } => AppError::NotFound(body),
            other => AppError::Network(other.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure reported by the HTTP transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network failure: {0}")]
    Network(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Network(_) => None,
        }
    }
}

/// Outcome taxonomy for a rejected or failed mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MutationError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient failure: {0}")]
    TransientFailure(String),

    #[error("Stale reconciliation for attempt {0}")]
    StaleReconciliation(String),
}

impl MutationError {
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::Unauthenticated => "unauthenticated",
            MutationError::InvalidOperation(_) => "invalid_operation",
            MutationError::Conflict(_) => "conflict",
            MutationError::NotFound(_) => "not_found",
            MutationError::TransientFailure(_) => "transient_failure",
            MutationError::StaleReconciliation(_) => "stale_reconciliation",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            MutationError::Unauthenticated => "Please sign in to continue.".to_string(),
            MutationError::InvalidOperation(reason) => reason.clone(),
            MutationError::Conflict(_) => "This change was already applied.".to_string(),
            MutationError::NotFound(_) => {
                "The item you were interacting with no longer exists.".to_string()
            }
            MutationError::TransientFailure(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            MutationError::StaleReconciliation(_) => String::new(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, MutationError::TransientFailure(_))
    }

    /// Maps a transport failure onto the mutation taxonomy.
    pub fn classify(err: &TransportError) -> Self {
        match err {
            TransportError::Network(msg) => MutationError::TransientFailure(msg.clone()),
            TransportError::Http { status, body } => match *status {
                401 => MutationError::Unauthenticated,
                404 => MutationError::NotFound(body.clone()),
                409 => MutationError::Conflict(body.clone()),
                408 | 429 => MutationError::TransientFailure(err.to_string()),
                500..=599 => MutationError::TransientFailure(err.to_string()),
                _ => MutationError::InvalidOperation(err.to_string()),
            },
        }
    }
}
