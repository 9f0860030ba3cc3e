//! # Figma SDK
//!
//! Transport-independent operations behind the Figma MCP tools:
//!
//! - [`request`]: typed tool requests and their validation
//! - [`design`]: fetch a file or node and hand it to the [`simplify`] pass
//! - [`images`]: deduplicate, download, post-process and upload images
//! - [`format`]: YAML / JSON rendering of results
//!
//! Every operation takes an explicit [`InvocationContext`] for logging and
//! its collaborators as `&dyn FigmaApi` / `&dyn ObjectStorage`, so the MCP
//! server and tests share one code path.
//!
//! [`FigmaApi`]: figma_client::FigmaApi

pub mod context;
pub mod design;
pub mod error;
pub mod format;
pub mod images;
pub mod request;
pub mod simplify;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use context::InvocationContext;
pub use design::fetch_design;
pub use error::{SdkError, SdkResult};
pub use format::OutputFormat;
pub use images::{download_images, DownloadReport, ImageError};
pub use request::{
    DownloadImagesRequest, DownloadImagesSpec, GetFigmaDataRequest, ImageExportRequest,
    ImageNodeSpec, ImageSource, ValidationError,
};
pub use simplify::{SimplifiedDesign, SimplifyOptions};
