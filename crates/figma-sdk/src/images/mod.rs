//! # Image export
//!
//! Turns a batch of [`ImageExportRequest`](crate::request::ImageExportRequest)s
//! into files on disk and in object storage:
//!
//! 1. [`dedup::plan_downloads`] collapses requests that point at the same
//!    bitmap into one [`DownloadRecord`],
//! 2. [`pipeline::download_images`] resolves download URLs, fetches each
//!    record once, post-processes it ([`processing`]) and uploads it.

pub mod dedup;
pub mod pipeline;
pub mod processing;

use figma_client::ClientError;
use thiserror::Error;

pub use dedup::{apply_suffix, plan_downloads, DownloadPlan, DownloadRecord, DownloadTarget};
pub use pipeline::{download_images, DownloadReport, DownloadedImage};
pub use processing::{crop_rect, css_variables, process_image, CropRect, ImageDimensions, ProcessedImage};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(
        "Object storage is not configured; set AWS_REGION, S3_BUCKET_NAME, \
         AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY to enable image downloads"
    )]
    StorageNotConfigured,

    #[error(transparent)]
    Api(#[from] ClientError),

    #[error("Upload of {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to process image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SVG {path} declares no width/height or viewBox")]
    SvgDimensions { path: String },

    #[error("Image processing task failed: {0}")]
    Task(String),
}

impl ImageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageNotConfigured => "storage_not_configured",
            Self::Api(e) if e.is_storage() => "storage_error",
            Self::Upload { .. } => "storage_error",
            Self::Api(_) => "api_error",
            Self::Decode { .. } | Self::Io { .. } | Self::SvgDimensions { .. } | Self::Task(_) => {
                "image_processing_error"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ImageError::StorageNotConfigured.code(), "storage_not_configured");
        assert_eq!(
            ImageError::from(ClientError::invalid_response("image fill abc", "no URL")).code(),
            "api_error"
        );
        assert_eq!(
            ImageError::Upload {
                path: "a.png".into(),
                source: ClientError::storage_error(403, "denied"),
            }
            .code(),
            "storage_error"
        );
        assert_eq!(
            ImageError::SvgDimensions { path: "a.svg".into() }.code(),
            "image_processing_error"
        );
    }
}
