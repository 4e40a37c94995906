//! Error handling for the edit-server

use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for edit-server operations
pub type Result<T> = std::result::Result<T, EdsrvError>;

/// Main error type for the edit-server
#[derive(Error, Debug)]
pub enum EdsrvError {
    /// Configuration-related errors
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The editor command could not be started
    #[error("unable to run editor '{command}': {source}")]
    EditorSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor command ran but did not exit successfully
    #[error("editor '{command}' {status}")]
    EditorExit {
        command: String,
        status: ExitStatus,
        output: String,
    },

    /// Network/server errors
    #[error("server error: {0}")]
    Server(String),

    /// The status endpoint could not be reached
    #[error("{url}: connection error: {reason}")]
    StatusConnection { url: String, reason: String },

    /// The status endpoint answered with anything other than 200
    #[error("non-successful status code {0} returned")]
    StatusCode(u16),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EdsrvError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new server error
    pub fn server<S: Into<String>>(msg: S) -> Self {
        Self::Server(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Anything raised while serving a single request is recoverable, the
    /// server keeps running and the next request starts from scratch.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EdsrvError::Config(_) => false,
            EdsrvError::EditorSpawn { .. } => true,
            EdsrvError::EditorExit { .. } => true,
            EdsrvError::Server(_) => false,
            EdsrvError::StatusConnection { .. } => false,
            EdsrvError::StatusCode(_) => false,
            EdsrvError::Io(_) => true,
            EdsrvError::Json(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EdsrvError::Config(_) => ErrorSeverity::Critical,
            EdsrvError::EditorSpawn { .. } => ErrorSeverity::High,
            EdsrvError::EditorExit { .. } => ErrorSeverity::Medium,
            EdsrvError::Server(_) => ErrorSeverity::Critical,
            EdsrvError::StatusConnection { .. } => ErrorSeverity::High,
            EdsrvError::StatusCode(_) => ErrorSeverity::High,
            EdsrvError::Io(_) => ErrorSeverity::Medium,
            EdsrvError::Json(_) => ErrorSeverity::High,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_fatal() {
        let err = EdsrvError::config("flag \"editor\" is not informed");
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(
            err.to_string(),
            "invalid configuration: flag \"editor\" is not informed"
        );
    }

    #[test]
    fn test_request_errors_are_recoverable() {
        let spawn = EdsrvError::EditorSpawn {
            command: "missing-editor".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(spawn.is_recoverable());
        assert!(spawn.to_string().contains("missing-editor"));
        assert!(spawn.to_string().contains("not found"));

        let io: EdsrvError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(io.is_recoverable());
    }

    #[test]
    fn test_status_code_message() {
        let err = EdsrvError::StatusCode(503);
        assert_eq!(err.to_string(), "non-successful status code 503 returned");
        assert!(err.severity() > ErrorSeverity::Medium);
    }
}
