//! Raw Figma REST API response types.
//!
//! Only the fields the simplifier and the image pipeline read are modelled;
//! everything else in the payload is ignored during deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// `GET /v1/files/:key`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub name: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub document: Node,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub component_sets: BTreeMap<String, ComponentSet>,
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,
}

/// `GET /v1/files/:key/nodes?ids=...`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodesResponse {
    pub name: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub thumbnail_url: String,
    /// Figma returns `null` for ids that do not exist in the file.
    #[serde(default)]
    pub nodes: BTreeMap<String, Option<NodeEntry>>,
}

/// One requested subtree with the component/style dictionaries it references.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    pub document: Node,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub component_sets: BTreeMap<String, ComponentSet>,
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,
}

/// `GET /v1/images/:key`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRenderResponse {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub images: BTreeMap<String, Option<String>>,
}

/// `GET /v1/files/:key/images`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageFillsResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub status: Option<u16>,
    pub meta: ImageFillsMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageFillsMeta {
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub component_set_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSet {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Entry of the document's published style dictionary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub style_type: String,
    #[serde(default)]
    pub description: String,
}

/// A node of the design document tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub absolute_bounding_box: Option<Rectangle>,

    // Auto layout
    #[serde(default)]
    pub layout_mode: Option<String>,
    #[serde(default)]
    pub primary_axis_align_items: Option<String>,
    #[serde(default)]
    pub counter_axis_align_items: Option<String>,
    #[serde(default)]
    pub layout_align: Option<String>,
    #[serde(default)]
    pub layout_grow: Option<f64>,
    #[serde(default)]
    pub layout_wrap: Option<String>,
    #[serde(default)]
    pub layout_positioning: Option<String>,
    #[serde(default)]
    pub layout_sizing_horizontal: Option<String>,
    #[serde(default)]
    pub layout_sizing_vertical: Option<String>,
    #[serde(default)]
    pub item_spacing: Option<f64>,
    #[serde(default)]
    pub padding_top: Option<f64>,
    #[serde(default)]
    pub padding_right: Option<f64>,
    #[serde(default)]
    pub padding_bottom: Option<f64>,
    #[serde(default)]
    pub padding_left: Option<f64>,
    #[serde(default)]
    pub overflow_direction: Option<String>,
    #[serde(default)]
    pub preserve_ratio: Option<bool>,

    // Visuals
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub strokes: Vec<Paint>,
    #[serde(default)]
    pub stroke_weight: Option<f64>,
    #[serde(default)]
    pub stroke_dashes: Option<Vec<f64>>,
    #[serde(default)]
    pub individual_stroke_weights: Option<StrokeWeights>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub rectangle_corner_radii: Option<Vec<f64>>,

    // Text
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub style: Option<TypeStyle>,

    // Components
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub component_properties: Option<BTreeMap<String, ComponentProperty>>,

    /// Style-type (`fill`, `text`, ...) to style id references.
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
}

impl Node {
    /// True when any visible fill is a bitmap.
    pub fn has_image_fill(&self) -> bool {
        self.fills
            .iter()
            .any(|paint| paint.visible && paint.paint_type == "IMAGE")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

/// RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub paint_type: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub gradient_handle_positions: Vec<Vector>,
    #[serde(default)]
    pub gradient_stops: Vec<ColorStop>,
    #[serde(default)]
    pub scale_mode: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
    /// 2x3 affine transform applied to the image inside its frame.
    #[serde(default)]
    pub image_transform: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub scaling_factor: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub offset: Option<Vector>,
    #[serde(default)]
    pub spread: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct StrokeWeights {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_weight: Option<f64>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub line_height_px: Option<f64>,
    #[serde(default)]
    pub letter_spacing: Option<f64>,
    #[serde(default)]
    pub text_case: Option<String>,
    #[serde(default)]
    pub text_align_horizontal: Option<String>,
    #[serde(default)]
    pub text_align_vertical: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentProperty {
    #[serde(rename = "type")]
    pub property_type: String,
    pub value: serde_json::Value,
}
