use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse error class a request layer maps to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    InvalidRequest,
    Conflict,
    Internal,
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classify the error for callers
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::InvalidRequest { .. } | Self::Validation { .. } => ErrorClass::InvalidRequest,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::Internal { .. } | Self::Storage { .. } | Self::Configuration { .. } => {
                ErrorClass::Internal
            }
        }
    }

    /// Wrap a store failure with context. Conflicts pass through untouched
    /// so callers can tell a stale read from a broken store.
    pub fn into_internal(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Conflict { .. } => self,
            other => Self::internal(format!("{}: {}", context, other)),
        }
    }
}
