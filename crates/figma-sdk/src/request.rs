//! Typed tool requests and their validation.
//!
//! Transport layers hand over loosely-typed specs ([`DownloadImagesSpec`],
//! plain strings for the data tool); the constructors here check every field
//! before any network call is made and return either a fully typed request or
//! a [`ValidationError`] naming the offending field.

use std::path::{Component, PathBuf};

use figma_client::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Default raster export scale.
pub const DEFAULT_PNG_SCALE: f64 = 2.0;
/// Upper bound accepted by the Figma render endpoint.
pub const MAX_PNG_SCALE: f64 = 4.0;
/// Directory (relative to the working directory) downloads land in.
pub const DEFAULT_IMAGE_DIR: &str = "figma-images";

pub const FILE_KEY_PATTERN: &str = r"^[a-zA-Z0-9]+$";
pub const NODE_ID_PATTERN: &str = r"^I?\d+[:|-]\d+(?:;\d+[:|-]\d+)*$";
pub const FILE_NAME_PATTERN: &str = r"^[a-zA-Z0-9_.-]+\.(png|svg)$";
pub const IMAGE_REF_PATTERN: &str = r"^[a-zA-Z0-9]+$";
pub const SUFFIX_PATTERN: &str = r"^[a-zA-Z0-9_-]+$";

static FILE_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(FILE_KEY_PATTERN).unwrap());
static NODE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(NODE_ID_PATTERN).unwrap());
static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(FILE_NAME_PATTERN).unwrap());
static IMAGE_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(IMAGE_REF_PATTERN).unwrap());
static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(SUFFIX_PATTERN).unwrap());

/// Input rejected before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 2x3 affine matrix `[[scaleX, skewX, translateX], [skewY, scaleY, translateY]]`.
pub type CropTransform = [[f64; 3]; 2];

/// Validated `get_figma_data` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFigmaDataRequest {
    pub file_key: String,
    /// Normalised to the `1:2` form.
    pub node_id: Option<String>,
    pub depth: Option<u32>,
}

impl GetFigmaDataRequest {
    pub fn new(
        file_key: &str,
        node_id: Option<&str>,
        depth: Option<u32>,
    ) -> Result<Self, ValidationError> {
        let file_key = validate_file_key(file_key)?;
        let node_id = node_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| validate_node_id("nodeId", id))
            .transpose()?;
        if depth == Some(0) {
            return Err(ValidationError::new("depth", "must be at least 1"));
        }
        Ok(Self {
            file_key,
            node_id,
            depth,
        })
    }
}

/// Unvalidated description of one image to export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageNodeSpec {
    pub node_id: Option<String>,
    pub image_ref: Option<String>,
    pub file_name: String,
    pub needs_cropping: bool,
    pub crop_transform: Option<Vec<Vec<f64>>>,
    pub requires_image_dimensions: bool,
    pub filename_suffix: Option<String>,
}

/// Unvalidated `download_figma_images` input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadImagesSpec {
    pub file_key: String,
    pub nodes: Vec<ImageNodeSpec>,
    pub png_scale: Option<f64>,
    pub local_path: Option<String>,
}

/// What an export request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A raster image fill, shared by every node that uses the same bitmap.
    Fill {
        image_ref: String,
        filename_suffix: Option<String>,
    },
    /// A node rendered by Figma in the format implied by the file name.
    Render { node_id: String, format: ImageFormat },
}

/// Validated single image export.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageExportRequest {
    /// Owning node, kept for log context even when the source is a fill.
    pub node_id: Option<String>,
    pub source: ImageSource,
    pub file_name: String,
    pub needs_cropping: bool,
    pub crop_transform: Option<CropTransform>,
    pub requires_image_dimensions: bool,
}

/// Validated `download_figma_images` request.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadImagesRequest {
    pub file_key: String,
    pub images: Vec<ImageExportRequest>,
    pub png_scale: f64,
    pub local_dir: PathBuf,
}

impl TryFrom<DownloadImagesSpec> for DownloadImagesRequest {
    type Error = ValidationError;

    fn try_from(spec: DownloadImagesSpec) -> Result<Self, Self::Error> {
        let file_key = validate_file_key(&spec.file_key)?;
        if spec.nodes.is_empty() {
            return Err(ValidationError::new("nodes", "at least one image is required"));
        }

        let png_scale = spec.png_scale.unwrap_or(DEFAULT_PNG_SCALE);
        if !png_scale.is_finite() || png_scale <= 0.0 || png_scale > MAX_PNG_SCALE {
            return Err(ValidationError::new(
                "pngScale",
                format!("must be greater than 0 and at most {MAX_PNG_SCALE}"),
            ));
        }

        let local_dir = validate_local_path(spec.local_path.as_deref())?;

        let images = spec
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| validate_image_node(index, node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            file_key,
            images,
            png_scale,
            local_dir,
        })
    }
}

pub fn validate_file_key(file_key: &str) -> Result<String, ValidationError> {
    if FILE_KEY_RE.is_match(file_key) {
        Ok(file_key.to_string())
    } else {
        Err(ValidationError::new(
            "fileKey",
            format!("'{file_key}' must match {FILE_KEY_PATTERN}"),
        ))
    }
}

/// Validate a node id and normalise URL-style `1-2` separators to `1:2`.
pub fn validate_node_id(field: &str, node_id: &str) -> Result<String, ValidationError> {
    if NODE_ID_RE.is_match(node_id) {
        Ok(node_id.replace('-', ":"))
    } else {
        Err(ValidationError::new(
            field,
            format!("'{node_id}' must match {NODE_ID_PATTERN}"),
        ))
    }
}

fn validate_local_path(local_path: Option<&str>) -> Result<PathBuf, ValidationError> {
    let Some(raw) = local_path.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(PathBuf::from(DEFAULT_IMAGE_DIR));
    };
    let path = PathBuf::from(raw);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ValidationError::new(
            "localPath",
            "must be a relative path without '..' segments",
        ));
    }
    Ok(path)
}

fn validate_image_node(
    index: usize,
    node: ImageNodeSpec,
) -> Result<ImageExportRequest, ValidationError> {
    let field = |name: &str| format!("nodes[{index}].{name}");

    if !FILE_NAME_RE.is_match(&node.file_name) {
        return Err(ValidationError::new(
            field("fileName"),
            format!("'{}' must match {FILE_NAME_PATTERN}", node.file_name),
        ));
    }

    let node_id = node
        .node_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| validate_node_id(&field("nodeId"), id))
        .transpose()?;

    let crop_transform = node
        .crop_transform
        .as_deref()
        .map(|rows| parse_crop_transform(rows).ok_or_else(|| {
            ValidationError::new(field("cropTransform"), "must be 2 rows of 3 finite numbers")
        }))
        .transpose()?;

    let image_ref = node
        .image_ref
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let source = match (image_ref, node_id.clone()) {
        (Some(image_ref), _) => {
            if !IMAGE_REF_RE.is_match(&image_ref) {
                return Err(ValidationError::new(
                    field("imageRef"),
                    "must be an alphanumeric image hash",
                ));
            }
            if ImageFormat::from_file_name(&node.file_name) == ImageFormat::Svg {
                return Err(ValidationError::new(
                    field("fileName"),
                    "image fills are raster images and need a .png file name",
                ));
            }
            let filename_suffix = node
                .filename_suffix
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            if let Some(suffix) = &filename_suffix {
                if !SUFFIX_RE.is_match(suffix) {
                    return Err(ValidationError::new(
                        field("filenameSuffix"),
                        format!("'{suffix}' must match {SUFFIX_PATTERN}"),
                    ));
                }
            }
            ImageSource::Fill {
                image_ref,
                filename_suffix,
            }
        }
        (None, Some(node_id)) => ImageSource::Render {
            node_id,
            format: ImageFormat::from_file_name(&node.file_name),
        },
        (None, None) => {
            return Err(ValidationError::new(
                format!("nodes[{index}]"),
                "either nodeId or imageRef is required",
            ))
        }
    };

    Ok(ImageExportRequest {
        node_id,
        source,
        file_name: node.file_name,
        needs_cropping: node.needs_cropping,
        crop_transform,
        requires_image_dimensions: node.requires_image_dimensions,
    })
}

fn parse_crop_transform(rows: &[Vec<f64>]) -> Option<CropTransform> {
    if rows.len() != 2 {
        return None;
    }
    let mut matrix = [[0.0; 3]; 2];
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != 3 || row.iter().any(|v| !v.is_finite()) {
            return None;
        }
        matrix[row_index].copy_from_slice(row);
    }
    Some(matrix)
}
