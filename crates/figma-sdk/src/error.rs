//! Error types for sdk operations.

use figma_client::ClientError;
use thiserror::Error;

use crate::images::ImageError;
use crate::request::ValidationError;

pub type SdkResult<T> = Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Node {node_id} was not found in file {file_key}")]
    NodeNotFound { file_key: String, node_id: String },

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SdkError {
    /// Stable machine-readable code reported at the tool boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_params",
            Self::Client(e) if e.is_storage() => "storage_error",
            Self::Client(_) | Self::NodeNotFound { .. } => "api_error",
            Self::Image(e) => e.code(),
            Self::Yaml(_) | Self::Json(_) => "serialization_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = SdkError::from(ValidationError::new("fileKey", "bad"));
        assert_eq!(err.code(), "invalid_params");
        assert_eq!(err.to_string(), "invalid fileKey: bad");

        let err = SdkError::from(ClientError::api_error(403, "Invalid token"));
        assert_eq!(err.code(), "api_error");

        let err = SdkError::from(ClientError::storage_error(403, "denied"));
        assert_eq!(err.code(), "storage_error");

        let err = SdkError::from(ImageError::StorageNotConfigured);
        assert_eq!(err.code(), "storage_not_configured");

        let err = SdkError::NodeNotFound {
            file_key: "abc".into(),
            node_id: "1:2".into(),
        };
        assert_eq!(err.code(), "api_error");
    }
}
