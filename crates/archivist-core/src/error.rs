//! Error types for life-archivist.

use thiserror::Error;

/// Result type alias using life-archivist's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for life-archivist operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found in the vault
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Vault storage operation failed
    #[error("Vault error: {0}")]
    Vault(String),

    /// Index service operation failed
    #[error("Index error: {0}")]
    Index(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// External service unreachable or timed out
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::Unavailable(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let err = Error::DocumentNotFound("blake3:abcd".to_string());
        assert_eq!(err.to_string(), "Document not found: blake3:abcd");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("limit must be >= 1".to_string());
        assert_eq!(err.to_string(), "Invalid input: limit must be >= 1");
    }

    #[test]
    fn test_error_display_vault() {
        let err = Error::Vault("disk full".to_string());
        assert_eq!(err.to_string(), "Vault error: disk full");
    }

    #[test]
    fn test_error_display_index() {
        let err = Error::Index("bad response".to_string());
        assert_eq!(err.to_string(), "Index error: bad response");
    }

    #[test]
    fn test_error_display_unavailable() {
        let err = Error::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Service unavailable: connection refused");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing base URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base URL");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
