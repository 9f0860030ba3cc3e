//! # Figma Client
//!
//! Clients for the two external collaborators of the Figma MCP server:
//!
//! - [`api`]: Figma REST API reads (files, nodes, renders, image fills) behind the
//!   [`FigmaApi`] trait
//! - [`storage`]: presigned-PUT uploads to S3-compatible storage behind the
//!   [`ObjectStorage`] trait
//!
//! Both traits exist so the server and its tests can swap in fakes; production code
//! uses [`FigmaRestClient`] and [`S3Uploader`].

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use api::{FigmaApi, FigmaRestClient, ImageFormat, RenderOptions};
pub use config::{ClientConfig, FigmaAuth, StorageConfig};
pub use error::{ClientError, ClientResult};
pub use storage::{content_type_for, ObjectStorage, S3Uploader, StoredObject};
