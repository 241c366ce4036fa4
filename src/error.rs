use thiserror::Error;

/// Failures the reconciliation engine can report.
///
/// `UpstreamUnavailable` is the only variant the facade swallows: a single
/// failing data source degrades to defaults, and it is surfaced only when
/// every source failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EngineError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        EngineError::UpstreamUnavailable(message.into())
    }
}

impl From<mongodb::error::Error> for EngineError {
    fn from(error: mongodb::error::Error) -> Self {
        EngineError::UpstreamUnavailable(format!("Database error: {}", error))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(error: reqwest::Error) -> Self {
        EngineError::UpstreamUnavailable(format!("Request failed: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
