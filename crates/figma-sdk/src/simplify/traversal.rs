//! Depth-first walk over the raw node tree.

use std::collections::BTreeMap;

use figma_client::models::{Node, Style};
use serde_json::Value;

use super::effects::simplify_effects;
use super::layout::{css_shorthand, simplify_layout};
use super::node::{
    ComponentPropertyValue, SimplifiedNode, SimplifiedStroke, StyleValue,
};
use super::paint::{round2, simplify_paint};
use super::style_table::StyleTable;
use super::text::simplify_text_style;
use super::{Extractor, SimplifyOptions};

const COLLAPSIBLE_TYPES: &[&str] = &["FRAME", "GROUP", "INSTANCE", "BOOLEAN_OPERATION"];
const VECTOR_TYPES: &[&str] = &[
    "IMAGE-SVG",
    "VECTOR",
    "STAR",
    "LINE",
    "ELLIPSE",
    "REGULAR_POLYGON",
    "RECTANGLE",
    "BOOLEAN_OPERATION",
];

pub(crate) struct Walker<'a> {
    options: &'a SimplifyOptions,
    document_styles: &'a BTreeMap<String, Style>,
    pub(crate) table: StyleTable,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        options: &'a SimplifyOptions,
        document_styles: &'a BTreeMap<String, Style>,
    ) -> Self {
        Self {
            options,
            document_styles,
            table: StyleTable::new(),
        }
    }

    /// Simplify `nodes` as siblings at `depth` (top level is depth 1).
    pub(crate) fn walk_all(
        &mut self,
        nodes: &[Node],
        parent: Option<&Node>,
        depth: u32,
    ) -> Vec<SimplifiedNode> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Vec::new();
        }
        nodes
            .iter()
            .filter(|node| node.visible)
            .map(|node| self.walk(node, parent, depth))
            .collect()
    }

    fn walk(&mut self, node: &Node, parent: Option<&Node>, depth: u32) -> SimplifiedNode {
        let mut simplified = SimplifiedNode {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: if node.node_type == "VECTOR" {
                "IMAGE-SVG".to_string()
            } else {
                node.node_type.clone()
            },
            ..Default::default()
        };

        let options = self.options;
        for extractor in &options.extractors {
            match extractor {
                Extractor::Layout => self.extract_layout(node, parent, &mut simplified),
                Extractor::Text => self.extract_text(node, &mut simplified),
                Extractor::Visuals => self.extract_visuals(node, &mut simplified),
                Extractor::Component => extract_component(node, &mut simplified),
            }
        }

        let children = self.walk_all(&node.children, Some(node), depth + 1);
        if !children.is_empty() {
            let collapse = COLLAPSIBLE_TYPES.contains(&node.node_type.as_str())
                && children.iter().all(|child| {
                    VECTOR_TYPES.contains(&child.node_type.as_str())
                        && !raw_child_has_image(node, &child.id)
                });
            if collapse {
                simplified.node_type = "IMAGE-SVG".to_string();
            } else {
                simplified.children = Some(children);
            }
        }
        simplified
    }

    /// Document style name referenced by `node.styles` under any of `keys`.
    fn named_style(&self, node: &Node, keys: &[&str]) -> Option<&'a str> {
        let styles = self.document_styles;
        keys.iter()
            .filter_map(|key| node.styles.get(*key))
            .find_map(|style_id| styles.get(style_id))
            .map(|style| style.name.as_str())
    }

    fn store(&mut self, node: &Node, keys: &[&str], prefix: &str, value: StyleValue) -> String {
        match self.named_style(node, keys) {
            Some(name) => self.table.intern_named(name, prefix, value),
            None => self.table.intern(prefix, value),
        }
    }

    fn extract_layout(&mut self, node: &Node, parent: Option<&Node>, out: &mut SimplifiedNode) {
        if let Some(layout) = simplify_layout(node, parent) {
            out.layout = Some(self.table.intern("layout", StyleValue::Layout(layout)));
        }
    }

    fn extract_text(&mut self, node: &Node, out: &mut SimplifiedNode) {
        if node.node_type != "TEXT" {
            return;
        }
        out.text = node.characters.clone();
        if let Some(style) = &node.style {
            let value = StyleValue::Text(simplify_text_style(style));
            out.text_style = Some(self.store(node, &["text"], "style", value));
        }
    }

    fn extract_visuals(&mut self, node: &Node, out: &mut SimplifiedNode) {
        let fills: Vec<_> = node.fills.iter().filter_map(simplify_paint).collect();
        if !fills.is_empty() {
            out.fills = Some(self.store(node, &["fill", "fills"], "fill", StyleValue::Fills(fills)));
        }

        let colors: Vec<_> = node.strokes.iter().filter_map(simplify_paint).collect();
        if !colors.is_empty() {
            let stroke = SimplifiedStroke {
                colors,
                stroke_weight: node
                    .stroke_weight
                    .filter(|w| *w > 0.0)
                    .map(|w| format!("{}px", round2(w))),
                stroke_dashes: node.stroke_dashes.clone().filter(|d| !d.is_empty()),
                stroke_weights: node
                    .individual_stroke_weights
                    .map(|w| css_shorthand(w.top, w.right, w.bottom, w.left)),
            };
            out.strokes = Some(self.store(
                node,
                &["stroke", "strokes"],
                "stroke",
                StyleValue::Stroke(stroke),
            ));
        }

        let effects = simplify_effects(node);
        if !effects.is_empty() {
            out.effects = Some(self.store(
                node,
                &["effect", "effects"],
                "effect",
                StyleValue::Effects(effects),
            ));
        }

        out.opacity = node.opacity.filter(|o| (*o - 1.0).abs() > f64::EPSILON);

        out.border_radius = match (&node.rectangle_corner_radii, node.corner_radius) {
            (Some(radii), _) if radii.len() == 4 && radii.iter().any(|r| *r > 0.0) => Some(
                radii
                    .iter()
                    .map(|r| format!("{}px", round2(*r)))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            (_, Some(radius)) if radius > 0.0 => Some(format!("{}px", round2(radius))),
            _ => None,
        };
    }
}

fn raw_child_has_image(parent: &Node, child_id: &str) -> bool {
    parent
        .children
        .iter()
        .find(|c| c.id == child_id)
        .is_some_and(Node::has_image_fill)
}

fn extract_component(node: &Node, out: &mut SimplifiedNode) {
    if node.node_type != "INSTANCE" {
        return;
    }
    out.component_id = node.component_id.clone();
    out.component_properties = node.component_properties.as_ref().map(|props| {
        props
            .iter()
            .map(|(name, prop)| ComponentPropertyValue {
                name: name.clone(),
                value: match &prop.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                property_type: prop.property_type.clone(),
            })
            .collect()
    });
}
