//! Parameter structs for the MCP tools.

use figma_sdk::request::{
    FILE_KEY_PATTERN, FILE_NAME_PATTERN, IMAGE_REF_PATTERN, MAX_PNG_SCALE, NODE_ID_PATTERN,
    SUFFIX_PATTERN,
};
use figma_sdk::{DownloadImagesSpec, ImageNodeSpec};
use schemars::JsonSchema;
use serde::Deserialize;

// ── get_figma_data ──

/// Parameters for the `get_figma_data` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFigmaDataParams {
    #[schemars(
        description = "The key of the Figma file, found in the URL: figma.com/(file|design)/<fileKey>/...",
        regex(pattern = FILE_KEY_PATTERN)
    )]
    pub file_key: String,

    #[schemars(
        description = "Optional node id, from the node-id=<nodeId> URL parameter (e.g. '1234:5678' or '1234-5678'). Fetches the whole file when omitted.",
        regex(pattern = NODE_ID_PATTERN)
    )]
    #[serde(default)]
    pub node_id: Option<String>,

    #[schemars(
        description = "How many levels deep to traverse the node tree. Only set this when explicitly asked to.",
        range(min = 1)
    )]
    #[serde(default)]
    pub depth: Option<u32>,
}

// ── download_figma_images ──

/// One image to export.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageNodeParam {
    #[schemars(
        description = "The id of the Figma node, formatted as '1234:5678'",
        regex(pattern = NODE_ID_PATTERN)
    )]
    #[serde(default)]
    pub node_id: Option<String>,

    #[schemars(
        description = "If the node has an image fill, its imageRef. Leave blank to render the node itself (vector or PNG).",
        regex(pattern = IMAGE_REF_PATTERN)
    )]
    #[serde(default)]
    pub image_ref: Option<String>,

    #[schemars(
        description = "Local file name, ending in .png or .svg (letters, digits, '.', '_' and '-' only)",
        regex(pattern = FILE_NAME_PATTERN)
    )]
    pub file_name: String,

    #[schemars(description = "Whether the image fill needs cropping (from imageDownloadArguments)")]
    #[serde(default)]
    pub needs_cropping: bool,

    #[schemars(
        description = "Figma 2x3 crop transform [[scaleX, skewX, translateX], [skewY, scaleY, translateY]]",
        length(equal = 2)
    )]
    #[serde(default)]
    pub crop_transform: Option<Vec<Vec<f64>>>,

    #[schemars(
        description = "Whether CSS variables with the image dimensions should be returned (tiled fills)"
    )]
    #[serde(default)]
    pub requires_image_dimensions: bool,

    #[schemars(
        description = "Suffix that keeps differently cropped variants of one image apart (from imageDownloadArguments)",
        regex(pattern = SUFFIX_PATTERN)
    )]
    #[serde(default)]
    pub filename_suffix: Option<String>,
}

/// Parameters for the `download_figma_images` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadImagesParams {
    #[schemars(description = "The key of the Figma file containing the images")]
    pub file_key: String,

    #[schemars(description = "The images to export", length(min = 1))]
    pub nodes: Vec<ImageNodeParam>,

    #[schemars(
        description = "Export scale for PNG images, greater than 0 and at most 4. Defaults to 2.",
        range(min = 0.0, max = MAX_PNG_SCALE)
    )]
    #[serde(default)]
    pub png_scale: Option<f64>,

    #[schemars(
        description = "Relative directory to download into, without '..' segments. Defaults to 'figma-images'."
    )]
    #[serde(default)]
    pub local_path: Option<String>,
}

impl From<ImageNodeParam> for ImageNodeSpec {
    fn from(p: ImageNodeParam) -> Self {
        Self {
            node_id: p.node_id,
            image_ref: p.image_ref,
            file_name: p.file_name,
            needs_cropping: p.needs_cropping,
            crop_transform: p.crop_transform,
            requires_image_dimensions: p.requires_image_dimensions,
            filename_suffix: p.filename_suffix,
        }
    }
}

impl From<DownloadImagesParams> for DownloadImagesSpec {
    fn from(p: DownloadImagesParams) -> Self {
        Self {
            file_key: p.file_key,
            nodes: p.nodes.into_iter().map(Into::into).collect(),
            png_scale: p.png_scale,
            local_path: p.local_path,
        }
    }
}
