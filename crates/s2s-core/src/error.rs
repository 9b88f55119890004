//! Error types for S2S event delivery.
//!
//! The mapper surfaces exactly two hard failures: events it will never
//! handle, and delivery attempts the caller should repeat later. Everything
//! else (missing optional fields, no device identifier) degrades to a
//! successful no-op.

use thiserror::Error;

/// Result type alias for S2S operations.
pub type S2sResult<T> = Result<T, S2sError>;

/// Main error type for S2S operations.
#[derive(Error, Debug)]
pub enum S2sError {
    /// Event type is not handled by this destination.
    #[error("{event_type} is not supported")]
    UnsupportedOperation { event_type: String, code: ErrorCode },

    /// Delivery failed in a way that should be retried.
    #[error("Retryable error: {message}")]
    Retryable {
        message: String,
        code: ErrorCode,
        status: Option<u16>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Event (EVT_xxx)
    EvtUnsupportedType,

    // Retry (RETRY_xxx)
    RetryTransport,
    RetryServerError,
    RetryRateLimited,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EvtUnsupportedType => "EVT_001",
            ErrorCode::RetryTransport => "RETRY_001",
            ErrorCode::RetryServerError => "RETRY_002",
            ErrorCode::RetryRateLimited => "RETRY_003",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl S2sError {
    /// Create an unsupported event type error.
    pub fn unsupported(event_type: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            event_type: event_type.into(),
            code: ErrorCode::EvtUnsupportedType,
        }
    }

    /// Create a retryable error for a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
            code: ErrorCode::RetryTransport,
            status: None,
        }
    }

    /// Classify an HTTP status code returned by the endpoint.
    ///
    /// Returns `None` for statuses the caller must treat as delivered.
    pub fn from_http_status(status: u16) -> Option<Self> {
        let code = match status {
            429 => ErrorCode::RetryRateLimited,
            s if s >= 500 => ErrorCode::RetryServerError,
            _ => return None,
        };

        Some(Self::Retryable {
            message: format!("Failed with {}", status),
            code,
            status: Some(status),
        })
    }

    /// Whether the whole invocation should be attempted again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedOperation { code, .. } => *code,
            Self::Retryable { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::Serialization(_) => ErrorCode::Internal,
        }
    }
}
