//! Figma REST API access.
//!
//! [`FigmaApi`] is the seam the rest of the workspace programs against;
//! [`FigmaRestClient`] is the reqwest-backed implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{FileResponse, ImageFillsResponse, ImageRenderResponse, NodesResponse};

/// Render format for `GET /v1/images/:key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    /// Format implied by an output file name (`.svg` renders as SVG, anything else as PNG).
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_ascii_lowercase().ends_with(".svg") {
            Self::Svg
        } else {
            Self::Png
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Svg => write!(f, "svg"),
        }
    }
}

/// Options for a node render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: ImageFormat,
    /// Raster scale; ignored by Figma for SVG.
    pub scale: f64,
    pub svg_outline_text: bool,
    pub svg_include_id: bool,
    pub svg_simplify_stroke: bool,
}

impl RenderOptions {
    pub fn png(scale: f64) -> Self {
        Self {
            format: ImageFormat::Png,
            scale,
            ..Self::svg()
        }
    }

    pub fn svg() -> Self {
        Self {
            format: ImageFormat::Svg,
            scale: 1.0,
            svg_outline_text: true,
            svg_include_id: false,
            svg_simplify_stroke: true,
        }
    }

    fn query(&self, ids: &[String]) -> Vec<(&'static str, String)> {
        let mut query = vec![("ids", ids.join(",")), ("format", self.format.to_string())];
        match self.format {
            ImageFormat::Png => query.push(("scale", self.scale.to_string())),
            ImageFormat::Svg => {
                query.push(("svg_outline_text", self.svg_outline_text.to_string()));
                query.push(("svg_include_id", self.svg_include_id.to_string()));
                query.push(("svg_simplify_stroke", self.svg_simplify_stroke.to_string()));
            }
        }
        query
    }
}

/// Read operations against the Figma API plus the asset fetch that follows a
/// render or image-fill lookup.
#[async_trait]
pub trait FigmaApi: Send + Sync + fmt::Debug {
    /// Fetch a whole file, optionally limited to `depth` levels.
    async fn get_file(&self, file_key: &str, depth: Option<u32>) -> ClientResult<FileResponse>;

    /// Fetch a single node subtree.
    async fn get_nodes(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> ClientResult<NodesResponse>;

    /// Map of `imageRef` to a short-lived download URL for every image fill in the file.
    async fn get_image_fills(&self, file_key: &str) -> ClientResult<BTreeMap<String, String>>;

    /// Render nodes and return node id to download URL. A `None` URL means
    /// Figma could not render that node.
    async fn render_images(
        &self,
        file_key: &str,
        node_ids: &[String],
        options: &RenderOptions,
    ) -> ClientResult<BTreeMap<String, Option<String>>>;

    /// Fetch an asset URL into `destination`, creating parent directories.
    /// Returns the number of bytes written.
    async fn download(&self, url: &str, destination: &Path) -> ClientResult<u64>;
}

/// reqwest-backed Figma API client.
#[derive(Debug)]
pub struct FigmaRestClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl FigmaRestClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("figma-context/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let (header, value) = self.config.auth.header();
        debug!(%url, auth = self.config.auth.kind(), "Figma API request");

        let response = self
            .http
            .get(&url)
            .header(header, value)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            warn!(%url, status = status.as_u16(), %message, "Figma API request failed");
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Figma error bodies use either `err` or `message`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("err")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

fn depth_query(depth: Option<u32>) -> Vec<(&'static str, String)> {
    depth.map(|d| ("depth", d.to_string())).into_iter().collect()
}

#[async_trait]
impl FigmaApi for FigmaRestClient {
    async fn get_file(&self, file_key: &str, depth: Option<u32>) -> ClientResult<FileResponse> {
        self.get_json(&format!("/files/{file_key}"), &depth_query(depth))
            .await
    }

    async fn get_nodes(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> ClientResult<NodesResponse> {
        let mut query = vec![("ids", node_id.to_string())];
        query.extend(depth_query(depth));
        self.get_json(&format!("/files/{file_key}/nodes"), &query)
            .await
    }

    async fn get_image_fills(&self, file_key: &str) -> ClientResult<BTreeMap<String, String>> {
        let response: ImageFillsResponse = self
            .get_json(&format!("/files/{file_key}/images"), &[])
            .await?;
        if response.error {
            return Err(ClientError::api_error(
                response.status.unwrap_or(500),
                "image fill lookup reported an error",
            ));
        }
        Ok(response.meta.images)
    }

    async fn render_images(
        &self,
        file_key: &str,
        node_ids: &[String],
        options: &RenderOptions,
    ) -> ClientResult<BTreeMap<String, Option<String>>> {
        if node_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let response: ImageRenderResponse = self
            .get_json(&format!("/images/{file_key}"), &options.query(node_ids))
            .await?;
        if let Some(err) = response.err {
            return Err(ClientError::api_error(400, err));
        }
        Ok(response.images)
    }

    async fn download(&self, url: &str, destination: &Path) -> ClientResult<u64> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::api_error(
                status.as_u16(),
                format!("asset download failed for {url}"),
            ));
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        debug!(path = %destination.display(), bytes = bytes.len(), "Asset downloaded");
        Ok(bytes.len() as u64)
    }
}
