use std::fmt;
use thiserror::Error;

/// Stable, machine-checkable error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Uniqueness,
    Forbidden,
    NotFound,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Uniqueness => "uniqueness_error",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Uniqueness violation: {0}")]
    Uniqueness(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn uniqueness(message: impl Into<String>) -> Self {
        Self::Uniqueness(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Uniqueness(_) => ErrorKind::Uniqueness,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::Uniqueness(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Storage(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(EngineError::validation("x").kind().as_str(), "validation_error");
        assert_eq!(EngineError::uniqueness("x").kind().as_str(), "uniqueness_error");
        assert_eq!(EngineError::forbidden("x").kind().as_str(), "forbidden");
        assert_eq!(EngineError::not_found("x").kind().as_str(), "not_found");
        assert_eq!(EngineError::conflict("x").kind().as_str(), "conflict");
        assert_eq!(EngineError::storage("x").kind().as_str(), "internal_error");
    }

    #[test]
    fn test_detail_strips_prefix() {
        let err = EngineError::not_found("Record not found");
        assert_eq!(err.detail(), "Record not found");
        assert_eq!(err.to_string(), "Not found: Record not found");
    }
}
