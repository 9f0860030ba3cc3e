//! In-memory collaborators for tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for dependants that want to drive the tools without network access.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use figma_client::models::{FileResponse, NodesResponse};
use figma_client::{
    content_type_for, ClientError, ClientResult, FigmaApi, ObjectStorage, RenderOptions,
    StoredObject,
};

const SAMPLE_FILE: &str = include_str!("../tests/fixtures/design_file.json");

/// Parsed copy of the bundled sample design file.
pub fn sample_file() -> FileResponse {
    serde_json::from_str(SAMPLE_FILE).expect("bundled fixture is valid")
}

/// PNG-encoded solid image of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("in-memory PNG encoding");
    buf
}

/// JPEG-encoded solid image of the given size, as Figma serves many image fills.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 120, 200]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("in-memory JPEG encoding");
    buf
}

/// Scripted [`FigmaApi`] that counts every call it receives.
#[derive(Debug, Default)]
pub struct FakeFigmaApi {
    file: Option<FileResponse>,
    nodes: Option<NodesResponse>,
    image_fills: BTreeMap<String, String>,
    renders: BTreeMap<String, String>,
    assets: HashMap<String, Vec<u8>>,
    failure: Option<(u16, String)>,
    calls: AtomicUsize,
    render_calls: AtomicUsize,
    downloads: AtomicUsize,
}

impl FakeFigmaApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: FileResponse) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_nodes(mut self, nodes: NodesResponse) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn with_image_fill(mut self, image_ref: &str, url: &str) -> Self {
        self.image_fills.insert(image_ref.to_string(), url.to_string());
        self
    }

    pub fn with_render(mut self, node_id: &str, url: &str) -> Self {
        self.renders.insert(node_id.to_string(), url.to_string());
        self
    }

    pub fn with_asset(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.to_string(), bytes);
        self
    }

    /// Make every API call fail with the given status.
    pub fn failing_with(mut self, status: u16, message: &str) -> Self {
        self.failure = Some((status, message.to_string()));
        self
    }

    /// Total calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some((status, message)) => Err(ClientError::api_error(*status, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FigmaApi for FakeFigmaApi {
    async fn get_file(&self, _file_key: &str, _depth: Option<u32>) -> ClientResult<FileResponse> {
        self.record_call()?;
        self.file
            .clone()
            .ok_or_else(|| ClientError::api_error(404, "Not found"))
    }

    async fn get_nodes(
        &self,
        _file_key: &str,
        _node_id: &str,
        _depth: Option<u32>,
    ) -> ClientResult<NodesResponse> {
        self.record_call()?;
        self.nodes
            .clone()
            .ok_or_else(|| ClientError::api_error(404, "Not found"))
    }

    async fn get_image_fills(&self, _file_key: &str) -> ClientResult<BTreeMap<String, String>> {
        self.record_call()?;
        Ok(self.image_fills.clone())
    }

    async fn render_images(
        &self,
        _file_key: &str,
        node_ids: &[String],
        _options: &RenderOptions,
    ) -> ClientResult<BTreeMap<String, Option<String>>> {
        self.record_call()?;
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(node_ids
            .iter()
            .map(|id| (id.clone(), self.renders.get(id).cloned()))
            .collect())
    }

    async fn download(&self, url: &str, destination: &Path) -> ClientResult<u64> {
        self.record_call()?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .assets
            .get(url)
            .ok_or_else(|| ClientError::api_error(404, format!("asset download failed for {url}")))?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// [`ObjectStorage`] that records uploaded paths instead of sending them.
#[derive(Debug, Default)]
pub struct FakeStorage {
    uploads: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects every upload with a 403.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, path: &Path) -> ClientResult<StoredObject> {
        std::fs::metadata(path)?;
        if self.fail {
            return Err(ClientError::storage_error(403, "AccessDenied"));
        }
        let mut uploads = self.uploads.lock().unwrap_or_else(PoisonError::into_inner);
        uploads.push(path.to_path_buf());
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        let key = format!("uploads/{}.{extension}", uploads.len());
        Ok(StoredObject {
            url: format!("https://storage.test/{key}"),
            key,
            content_type: content_type_for(path),
        })
    }
}
