//! MCP ServerHandler implementation for Figma.
//!
//! Tools:
//! - `get_figma_data`: fetch a file or node and return the simplified design
//!   (metadata, node tree, global style table)
//! - `download_figma_images`: export image fills and rendered nodes, crop
//!   and measure them, and upload them to object storage. Not registered when
//!   image downloads are disabled.
//!
//! Each call gets its own [`InvocationContext`]; every failure is reported as
//! an `isError` tool result whose text is `{"error": <code>, "message": ...}`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use figma_client::{ClientConfig, FigmaApi, FigmaRestClient, ObjectStorage, S3Uploader};
use figma_sdk::{
    download_images, fetch_design, DownloadImagesRequest, DownloadImagesSpec, GetFigmaDataRequest,
    InvocationContext, OutputFormat, SdkResult,
};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::tools::*;

/// Figma MCP server handler.
#[derive(Debug, Clone)]
pub struct FigmaMcpServer {
    tool_router: ToolRouter<Self>,
    api: Arc<dyn FigmaApi>,
    storage: Option<Arc<dyn ObjectStorage>>,
    output_format: OutputFormat,
    images_enabled: bool,
    /// Directory request-relative download paths are resolved against.
    download_root: Option<PathBuf>,
}

impl FigmaMcpServer {
    /// Create a server with both tools registered.
    pub fn new(
        api: Arc<dyn FigmaApi>,
        storage: Option<Arc<dyn ObjectStorage>>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            tool_router: Self::data_router() + Self::image_router(),
            api,
            storage,
            output_format,
            images_enabled: true,
            download_root: None,
        }
    }

    /// Drop the `download_figma_images` tool.
    #[must_use]
    pub fn without_image_downloads(mut self) -> Self {
        self.tool_router = Self::data_router();
        self.images_enabled = false;
        self
    }

    /// Resolve download directories against `root` instead of the working directory.
    #[must_use]
    pub fn with_download_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.download_root = Some(root.into());
        self
    }

    /// Build the production server: REST client plus S3 uploader when storage
    /// is configured.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let api = FigmaRestClient::new(ClientConfig::new(config.auth.value))
            .context("failed to build Figma API client")?;
        let storage = config
            .storage
            .map(S3Uploader::new)
            .transpose()
            .context("invalid object storage configuration")?
            .map(|uploader| Arc::new(uploader) as Arc<dyn ObjectStorage>);

        let server = Self::new(Arc::new(api), storage, config.output_format.value);
        Ok(if config.skip_image_downloads.value {
            server.without_image_downloads()
        } else {
            server
        })
    }

    /// Names of the registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    async fn run_get_figma_data(
        &self,
        ctx: &InvocationContext,
        params: GetFigmaDataParams,
    ) -> SdkResult<String> {
        let request =
            GetFigmaDataRequest::new(&params.file_key, params.node_id.as_deref(), params.depth)?;
        let design = fetch_design(ctx, self.api.as_ref(), &request).await?;
        self.output_format.render(&design)
    }

    async fn run_download_images(
        &self,
        ctx: &InvocationContext,
        params: DownloadImagesParams,
    ) -> SdkResult<String> {
        let mut request = DownloadImagesRequest::try_from(DownloadImagesSpec::from(params))?;
        if let Some(root) = &self.download_root {
            request.local_dir = root.join(&request.local_dir);
        }
        let report = download_images(ctx, self.api.as_ref(), self.storage.as_deref(), &request)
            .await?;
        self.output_format.render(&report)
    }

    fn finish(ctx: &InvocationContext, result: SdkResult<String>) -> CallToolResult {
        match result {
            Ok(text) => {
                info!(parent: ctx.span(), bytes = text.len(), "Tool call succeeded");
                CallToolResult::success(vec![Content::text(text)])
            }
            Err(e) => {
                warn!(parent: ctx.span(), code = e.code(), error = %e, "Tool call failed");
                sdk_error_result(&e)
            }
        }
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FigmaMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut instructions = String::from(
            "Figma design context for code generation. Call get_figma_data with the fileKey \
             (and nodeId when the URL has node-id) to get a simplified node tree. Style values \
             are deduplicated into globalVars.styles and referenced from nodes by id.",
        );
        if self.images_enabled {
            instructions.push_str(
                "\nTo export assets, pass image fills (imageRef plus the imageDownloadArguments \
                 from get_figma_data) or node ids (IMAGE-SVG nodes as .svg, others as .png) to \
                 download_figma_images. Images are cropped as requested and uploaded; the result \
                 lists storage URLs and, for tiled fills, CSS dimension variables.",
            );
        }

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "figma-mcp".to_string(),
                title: Some("Figma MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "MCP server exposing simplified Figma design data and image export".to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions),
        }
    }
}

#[tool_router(router = data_router)]
impl FigmaMcpServer {
    /// Fetch a Figma file or node as a simplified design.
    #[tool(
        name = "get_figma_data",
        description = "Get layout, text, visual and component information for a Figma file, or for a single node when nodeId is given. Returns metadata, a simplified node tree and a table of shared styles."
    )]
    pub async fn get_figma_data(
        &self,
        Parameters(params): Parameters<GetFigmaDataParams>,
    ) -> Result<CallToolResult, McpError> {
        let ctx = InvocationContext::new("get_figma_data");
        info!(
            parent: ctx.span(),
            file_key = %params.file_key,
            node_id = params.node_id.as_deref().unwrap_or("-"),
            depth = params.depth,
            "Tool called"
        );
        let result = self.run_get_figma_data(&ctx, params).await;
        Ok(Self::finish(&ctx, result))
    }
}

#[tool_router(router = image_router)]
impl FigmaMcpServer {
    /// Export images from a Figma file to local files and object storage.
    #[tool(
        name = "download_figma_images",
        description = "Download SVG and PNG images used in a Figma file, based on the ids of image or icon nodes and the imageRef of image fills. Crops and measures images as requested and uploads them to object storage."
    )]
    pub async fn download_figma_images(
        &self,
        Parameters(params): Parameters<DownloadImagesParams>,
    ) -> Result<CallToolResult, McpError> {
        let ctx = InvocationContext::new("download_figma_images");
        info!(
            parent: ctx.span(),
            file_key = %params.file_key,
            images = params.nodes.len(),
            "Tool called"
        );
        let result = self.run_download_images(&ctx, params).await;
        Ok(Self::finish(&ctx, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figma_sdk::testing::{png_bytes, sample_file, FakeFigmaApi, FakeStorage};
    use serde_json::{json, Value};

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.raw.as_text())
            .map(|t| t.text.clone())
            .expect("Expected text content")
    }

    fn error_code(result: &CallToolResult) -> String {
        assert_eq!(result.is_error, Some(true), "expected an error result");
        let parsed: Value = serde_json::from_str(&text_of(result)).unwrap();
        parsed["error"].as_str().unwrap().to_string()
    }

    fn data_params(file_key: &str) -> Parameters<GetFigmaDataParams> {
        Parameters(GetFigmaDataParams {
            file_key: file_key.to_string(),
            node_id: None,
            depth: None,
        })
    }

    fn image_params(value: Value) -> Parameters<DownloadImagesParams> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_server_info() {
        let server = FigmaMcpServer::new(Arc::new(FakeFigmaApi::new()), None, OutputFormat::Yaml);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "figma-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("get_figma_data"));
        assert!(instructions.contains("download_figma_images"));
    }

    #[test]
    fn test_image_tool_not_registered_when_disabled() {
        let server = FigmaMcpServer::new(Arc::new(FakeFigmaApi::new()), None, OutputFormat::Yaml);
        let mut names = server.tool_names();
        names.sort();
        assert_eq!(names, vec!["download_figma_images", "get_figma_data"]);

        let server = server.without_image_downloads();
        assert_eq!(server.tool_names(), vec!["get_figma_data"]);
        assert!(!server
            .get_info()
            .instructions
            .unwrap()
            .contains("download_figma_images"));
    }

    #[tokio::test]
    async fn test_get_figma_data_yaml() {
        let api = Arc::new(FakeFigmaApi::new().with_file(sample_file()));
        let server = FigmaMcpServer::new(api.clone(), None, OutputFormat::Yaml);

        let result = server.get_figma_data(data_params("abc123")).await.unwrap();
        assert_ne!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.contains("metadata:"));
        assert!(text.contains("name: Marketing Site"));
        assert!(text.contains("globalVars:"));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_figma_data_json() {
        let api = Arc::new(FakeFigmaApi::new().with_file(sample_file()));
        let server = FigmaMcpServer::new(api, None, OutputFormat::Json);

        let result = server.get_figma_data(data_params("abc123")).await.unwrap();
        let parsed: Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(parsed["metadata"]["name"], "Marketing Site");
        assert_eq!(parsed["nodes"][0]["type"], "CANVAS");
        assert!(parsed["globalVars"]["styles"]["Surface/Default"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_file_key_makes_no_api_calls() {
        let api = Arc::new(FakeFigmaApi::new().with_file(sample_file()));
        let storage = Arc::new(FakeStorage::new());
        let server = FigmaMcpServer::new(api.clone(), Some(storage), OutputFormat::Yaml);

        let result = server.get_figma_data(data_params("abc/def")).await.unwrap();
        assert_eq!(error_code(&result), "invalid_params");

        let result = server
            .download_figma_images(image_params(json!({
                "fileKey": "abc/def",
                "nodes": [{"nodeId": "1:2", "fileName": "a.png"}]
            })))
            .await
            .unwrap();
        assert_eq!(error_code(&result), "invalid_params");
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_storage_only_affects_image_tool() {
        let api = Arc::new(FakeFigmaApi::new().with_file(sample_file()));
        let server = FigmaMcpServer::new(api.clone(), None, OutputFormat::Yaml);

        let result = server
            .download_figma_images(image_params(json!({
                "fileKey": "abc123",
                "nodes": [{"nodeId": "1:4", "imageRef": "8f2a7c41d9e0b3a6", "fileName": "shot.png"}]
            })))
            .await
            .unwrap();
        assert_eq!(error_code(&result), "storage_not_configured");
        assert_eq!(api.calls(), 0);

        let result = server.get_figma_data(data_params("abc123")).await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_download_figma_images_reports_every_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let api = Arc::new(
            FakeFigmaApi::new()
                .with_image_fill("abc", "https://figma.test/abc")
                .with_asset("https://figma.test/abc", png_bytes(12, 8)),
        );
        let storage = Arc::new(FakeStorage::new());
        let server = FigmaMcpServer::new(api, Some(storage.clone()), OutputFormat::Json)
            .with_download_root(dir.path());

        let result = server
            .download_figma_images(image_params(json!({
                "fileKey": "abc123",
                "nodes": [
                    {"nodeId": "1:1", "imageRef": "abc", "fileName": "a.png"},
                    {"nodeId": "1:2", "imageRef": "abc", "fileName": "b.png", "requiresImageDimensions": true}
                ],
                "localPath": "assets"
            })))
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(parsed["requested"], 2);
        assert_eq!(parsed["downloaded"], 1);
        let image = &parsed["images"][0];
        assert_eq!(image["fileNames"], json!(["a.png", "b.png"]));
        assert_eq!(image["finalDimensions"], json!({"width": 12, "height": 8}));
        assert_eq!(
            image["cssVariables"],
            "--original-width: 12px; --original-height: 8px;"
        );
        assert!(image["storageUrl"].as_str().unwrap().starts_with("https://storage.test/"));
        assert!(dir.path().join("assets").join("a.png").exists());
        assert_eq!(storage.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_png_scale() {
        let server = FigmaMcpServer::new(
            Arc::new(FakeFigmaApi::new()),
            Some(Arc::new(FakeStorage::new())),
            OutputFormat::Yaml,
        );
        let result = server
            .download_figma_images(image_params(json!({
                "fileKey": "abc123",
                "nodes": [{"nodeId": "1:2", "fileName": "a.png"}],
                "pngScale": 8
            })))
            .await
            .unwrap();
        assert_eq!(error_code(&result), "invalid_params");
        assert!(text_of(&result).contains("pngScale"));
    }

    #[tokio::test]
    async fn test_api_failure_reported() {
        let server = FigmaMcpServer::new(
            Arc::new(FakeFigmaApi::new().failing_with(403, "Invalid token")),
            None,
            OutputFormat::Yaml,
        );
        let result = server.get_figma_data(data_params("abc123")).await.unwrap();
        assert_eq!(error_code(&result), "api_error");
        assert!(text_of(&result).contains("Invalid token"));
    }
}
