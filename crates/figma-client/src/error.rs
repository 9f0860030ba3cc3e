//! # Client Error Types
//!
//! Unified error handling for the Figma API client and the storage uploader.

use thiserror::Error;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Error types for Figma API and object storage operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Figma API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Storage error: {status} - {message}")]
    StorageError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },
}

impl ClientError {
    /// Create an API error from an HTTP response
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create a storage error from an upload response
    pub fn storage_error(status: u16, message: impl Into<String>) -> Self {
        Self::StorageError {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid response error for payloads missing required data
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the error originated from the object store rather than Figma.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, ClientError::StorageError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_constructor() {
        let err = ClientError::api_error(404, "not found");
        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not found");
            }
            _ => panic!("Expected ApiError variant"),
        }
    }

    #[test]
    fn test_storage_error_constructor() {
        let err = ClientError::storage_error(403, "SignatureDoesNotMatch");
        assert!(err.is_storage());
        assert_eq!(
            format!("{err}"),
            "Storage error: 403 - SignatureDoesNotMatch"
        );
    }

    #[test]
    fn test_display_api_error() {
        let err = ClientError::api_error(403, "Invalid token");
        assert_eq!(format!("{err}"), "Figma API error: 403 - Invalid token");
    }

    #[test]
    fn test_display_invalid_response() {
        let err = ClientError::invalid_response("images.1:2", "no render url");
        assert_eq!(
            format!("{err}"),
            "Invalid response: images.1:2 - no render url"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::SerializationError(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no access");
        let err: ClientError = io_err.into();
        assert!(matches!(err, ClientError::IoError(_)));
        assert!(!err.is_storage());
    }
}
