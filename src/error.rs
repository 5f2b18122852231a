//! Error types surfaced through the response envelope
use thiserror::Error;

/// Why a tab URL was refused
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("Session management is not supported on non-http/https pages.")]
    InvalidUrl,
    #[error("Session management is only supported for http, https, and localhost pages.")]
    UnsupportedProtocol,
    #[error("Saving session on this type of page is not supported.")]
    UnsupportedPageType,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active tab found")]
    NoActiveTab,

    #[error(transparent)]
    InvalidOrUnsupportedUrl(#[from] UrlRejection),

    #[error("Session with ID {0} not found")]
    SessionNotFound(String),

    #[error("No {0} provided")]
    MissingRequiredField(&'static str),

    /// A browser or storage API rejected the call
    #[error("Failed to {operation}: {message}")]
    StorageAccess { operation: String, message: String },

    #[error("Unknown action: {0}")]
    UnknownCommand(String),

    #[error("Malformed data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    pub fn storage(operation: &str, message: impl Into<String>) -> SessionError {
        SessionError::StorageAccess {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
