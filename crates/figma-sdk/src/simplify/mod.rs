//! # Design simplifier
//!
//! Condenses a raw Figma document into a list of [`SimplifiedNode`]s plus a
//! global table of deduplicated style values. Nodes reference table entries
//! by id (`fill_3FA2C1`, `layout_09BE44`, or a document style name), so a
//! colour used on two hundred nodes is emitted once.
//!
//! The walk is a single depth-first pre-order pass:
//!
//! - invisible nodes are dropped together with their subtrees,
//! - each configured [`Extractor`] contributes fields to the node,
//! - `VECTOR` nodes are reported as `IMAGE-SVG`,
//! - a container whose kept children are all vector geometry collapses into
//!   one `IMAGE-SVG` node,
//! - traversal stops at [`SimplifyOptions::max_depth`].

mod effects;
mod layout;
pub mod node;
mod paint;
mod style_table;
mod text;
mod traversal;

use std::collections::BTreeMap;

use figma_client::models::{Component, ComponentSet, FileResponse, NodesResponse, Style};
use tracing::debug;

pub use node::{
    ComponentPropertyValue, ComponentSetSummary, ComponentSummary, DesignMetadata, Dimensions,
    GlobalVars, ImageDownloadArguments, ImageFill, LayoutSizing, SimplifiedDesign,
    SimplifiedEffects, SimplifiedFill, SimplifiedLayout, SimplifiedNode, SimplifiedStroke,
    StyleValue, TextStyle,
};
pub use style_table::StyleTable;

use traversal::Walker;

/// A family of properties pulled from each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Layout,
    Text,
    Visuals,
    Component,
}

impl Extractor {
    pub const ALL: [Extractor; 4] = [
        Extractor::Layout,
        Extractor::Text,
        Extractor::Visuals,
        Extractor::Component,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifyOptions {
    pub extractors: Vec<Extractor>,
    /// Number of node levels to keep; top-level nodes are level 1.
    pub max_depth: Option<u32>,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            extractors: Extractor::ALL.to_vec(),
            max_depth: None,
        }
    }
}

impl SimplifyOptions {
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Simplify a whole file. Top-level nodes are the document's pages.
pub fn simplify_file(file: &FileResponse, options: &SimplifyOptions) -> SimplifiedDesign {
    let mut walker = Walker::new(options, &file.styles);
    let nodes = walker.walk_all(&file.document.children, Some(&file.document), 1);
    finish(
        metadata(
            &file.name,
            &file.last_modified,
            &file.thumbnail_url,
            &file.components,
            &file.component_sets,
        ),
        nodes,
        walker.table,
    )
}

/// Simplify the subtrees returned by a node lookup. Missing (null) entries
/// are skipped.
pub fn simplify_nodes(response: &NodesResponse, options: &SimplifyOptions) -> SimplifiedDesign {
    let entries: Vec<_> = response.nodes.values().flatten().collect();

    let mut styles: BTreeMap<String, Style> = BTreeMap::new();
    let mut components: BTreeMap<String, Component> = BTreeMap::new();
    let mut component_sets: BTreeMap<String, ComponentSet> = BTreeMap::new();
    for entry in &entries {
        styles.extend(entry.styles.iter().map(|(k, v)| (k.clone(), v.clone())));
        components.extend(entry.components.iter().map(|(k, v)| (k.clone(), v.clone())));
        component_sets.extend(
            entry
                .component_sets
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    let mut walker = Walker::new(options, &styles);
    let mut nodes = Vec::with_capacity(entries.len());
    for entry in &entries {
        nodes.extend(walker.walk_all(std::slice::from_ref(&entry.document), None, 1));
    }
    finish(
        metadata(
            &response.name,
            &response.last_modified,
            &response.thumbnail_url,
            &components,
            &component_sets,
        ),
        nodes,
        walker.table,
    )
}

fn finish(
    metadata: DesignMetadata,
    nodes: Vec<SimplifiedNode>,
    table: StyleTable,
) -> SimplifiedDesign {
    debug!(
        nodes = nodes.len(),
        styles = table.len(),
        "Design simplified"
    );
    SimplifiedDesign {
        metadata,
        nodes,
        global_vars: GlobalVars {
            styles: table.into_styles(),
        },
    }
}

fn metadata(
    name: &str,
    last_modified: &str,
    thumbnail_url: &str,
    components: &BTreeMap<String, Component>,
    component_sets: &BTreeMap<String, ComponentSet>,
) -> DesignMetadata {
    DesignMetadata {
        name: name.to_string(),
        last_modified: last_modified.to_string(),
        thumbnail_url: thumbnail_url.to_string(),
        components: components
            .iter()
            .map(|(id, c)| {
                (
                    id.clone(),
                    ComponentSummary {
                        id: id.clone(),
                        key: c.key.clone(),
                        name: c.name.clone(),
                        component_set_id: c.component_set_id.clone(),
                    },
                )
            })
            .collect(),
        component_sets: component_sets
            .iter()
            .map(|(id, s)| {
                (
                    id.clone(),
                    ComponentSetSummary {
                        id: id.clone(),
                        key: s.key.clone(),
                        name: s.name.clone(),
                        description: Some(s.description.clone()).filter(|d| !d.is_empty()),
                    },
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(document_children: serde_json::Value) -> FileResponse {
        serde_json::from_value(json!({
            "name": "Landing",
            "lastModified": "2024-05-01T10:00:00Z",
            "thumbnailUrl": "https://example.com/thumb.png",
            "document": {
                "id": "0:0",
                "name": "Document",
                "type": "DOCUMENT",
                "children": document_children
            },
            "components": {
                "10:1": {"key": "k1", "name": "Button", "componentSetId": "10:0"}
            },
            "componentSets": {
                "10:0": {"key": "ks", "name": "Button Set"}
            },
            "styles": {
                "S:brand": {"key": "sk", "name": "Brand/Primary", "styleType": "FILL"}
            }
        }))
        .unwrap()
    }

    fn red_fill() -> serde_json::Value {
        json!([{"type": "SOLID", "color": {"r": 1, "g": 0, "b": 0, "a": 1}}])
    }

    #[test]
    fn test_invisible_nodes_dropped() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [
                    {"id": "1:1", "name": "Shown", "type": "TEXT", "characters": "Hi"},
                    {"id": "1:2", "name": "Hidden", "type": "FRAME", "visible": false,
                     "children": [{"id": "1:3", "name": "Inner", "type": "TEXT"}]}
                ]
            }])),
            &SimplifyOptions::default(),
        );
        let page = &design.nodes[0];
        let children = page.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "1:1");
        assert_eq!(children[0].text.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_vector_container_collapses() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [{
                    "id": "2:0", "name": "Icon", "type": "FRAME",
                    "children": [
                        {"id": "2:1", "name": "Path", "type": "VECTOR"},
                        {"id": "2:2", "name": "Dot", "type": "ELLIPSE"}
                    ]
                }, {
                    "id": "3:0", "name": "Card", "type": "FRAME",
                    "children": [
                        {"id": "3:1", "name": "Path", "type": "VECTOR"},
                        {"id": "3:2", "name": "Label", "type": "TEXT"}
                    ]
                }]
            }])),
            &SimplifyOptions::default(),
        );
        let children = design.nodes[0].children.as_ref().unwrap();
        assert_eq!(children[0].node_type, "IMAGE-SVG");
        assert!(children[0].children.is_none());

        assert_eq!(children[1].node_type, "FRAME");
        let card_children = children[1].children.as_ref().unwrap();
        assert_eq!(card_children[0].node_type, "IMAGE-SVG");
        assert_eq!(card_children[1].node_type, "TEXT");
    }

    #[test]
    fn test_image_filled_rectangle_blocks_collapse() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [{
                    "id": "2:0", "name": "Hero", "type": "FRAME",
                    "children": [{
                        "id": "2:1", "name": "Photo", "type": "RECTANGLE",
                        "fills": [{"type": "IMAGE", "imageRef": "abc", "scaleMode": "FILL"}]
                    }]
                }]
            }])),
            &SimplifyOptions::default(),
        );
        let hero = &design.nodes[0].children.as_ref().unwrap()[0];
        assert_eq!(hero.node_type, "FRAME");
        assert!(hero.children.is_some());
    }

    #[test]
    fn test_depth_limit() {
        let doc = json!([{
            "id": "1:0", "name": "Page", "type": "CANVAS",
            "children": [{
                "id": "2:0", "name": "Frame", "type": "FRAME",
                "children": [{"id": "3:0", "name": "Deep", "type": "TEXT"}]
            }]
        }]);
        let design = simplify_file(&file(doc.clone()), &SimplifyOptions::default().with_max_depth(Some(2)));
        let frame = &design.nodes[0].children.as_ref().unwrap()[0];
        assert_eq!(frame.id, "2:0");
        assert!(frame.children.is_none());

        let design = simplify_file(&file(doc), &SimplifyOptions::default().with_max_depth(Some(1)));
        assert!(design.nodes[0].children.is_none());
    }

    #[test]
    fn test_shared_style_deduplicated() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [
                    {"id": "1:1", "name": "A", "type": "RECTANGLE", "fills": red_fill()},
                    {"id": "1:2", "name": "B", "type": "RECTANGLE", "fills": red_fill()}
                ]
            }])),
            &SimplifyOptions::default(),
        );
        let children = design.nodes[0].children.as_ref().unwrap();
        let a = children[0].fills.as_ref().unwrap();
        let b = children[1].fills.as_ref().unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("fill_"));
        assert_eq!(
            design.global_vars.styles.get(a),
            Some(&StyleValue::Fills(vec![SimplifiedFill::Css("#FF0000".into())]))
        );
    }

    #[test]
    fn test_named_style_used_as_id() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [{
                    "id": "1:1", "name": "A", "type": "RECTANGLE",
                    "fills": red_fill(), "styles": {"fill": "S:brand"}
                }]
            }])),
            &SimplifyOptions::default(),
        );
        let node = &design.nodes[0].children.as_ref().unwrap()[0];
        assert_eq!(node.fills.as_deref(), Some("Brand/Primary"));
        assert!(design.global_vars.styles.contains_key("Brand/Primary"));
    }

    #[test]
    fn test_extractor_selection() {
        let options = SimplifyOptions {
            extractors: vec![Extractor::Text],
            max_depth: None,
        };
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [{
                    "id": "1:1", "name": "Title", "type": "TEXT", "characters": "Hello",
                    "fills": red_fill(),
                    "style": {"fontFamily": "Inter", "fontSize": 20, "lineHeightPx": 30}
                }]
            }])),
            &options,
        );
        let title = &design.nodes[0].children.as_ref().unwrap()[0];
        assert!(title.fills.is_none());
        let style_id = title.text_style.as_ref().unwrap();
        assert!(style_id.starts_with("style_"));
        match design.global_vars.styles.get(style_id) {
            Some(StyleValue::Text(style)) => assert_eq!(style.line_height.as_deref(), Some("1.5em")),
            other => panic!("expected text style, got {other:?}"),
        }
    }

    #[test]
    fn test_instance_component_fields() {
        let design = simplify_file(
            &file(json!([{
                "id": "1:0", "name": "Page", "type": "CANVAS",
                "children": [{
                    "id": "1:1", "name": "Button", "type": "INSTANCE",
                    "componentId": "10:1",
                    "componentProperties": {
                        "Label": {"type": "TEXT", "value": "Buy"},
                        "Disabled": {"type": "BOOLEAN", "value": false}
                    }
                }]
            }])),
            &SimplifyOptions::default(),
        );
        let button = &design.nodes[0].children.as_ref().unwrap()[0];
        assert_eq!(button.component_id.as_deref(), Some("10:1"));
        let props = button.component_properties.as_ref().unwrap();
        assert_eq!(props.len(), 2);
        assert!(props.iter().any(|p| p.name == "Disabled" && p.value == "false"));
        assert_eq!(design.metadata.components["10:1"].name, "Button");
        assert_eq!(
            design.metadata.components["10:1"].component_set_id.as_deref(),
            Some("10:0")
        );
        assert_eq!(design.metadata.component_sets["10:0"].name, "Button Set");
    }

    #[test]
    fn test_simplify_nodes_skips_missing_entries() {
        let response: NodesResponse = serde_json::from_value(json!({
            "name": "Landing",
            "nodes": {
                "5:1": {
                    "document": {"id": "5:1", "name": "Hero", "type": "FRAME"},
                    "components": {}
                },
                "5:2": null
            }
        }))
        .unwrap();
        let design = simplify_nodes(&response, &SimplifyOptions::default());
        assert_eq!(design.nodes.len(), 1);
        assert_eq!(design.nodes[0].id, "5:1");
        assert_eq!(design.metadata.name, "Landing");
    }

    #[test]
    fn test_serialized_shape() {
        let design = simplify_file(
            &file(json!([{"id": "1:0", "name": "Page", "type": "CANVAS"}])),
            &SimplifyOptions::default(),
        );
        let value = serde_json::to_value(&design).unwrap();
        assert_eq!(value["metadata"]["name"], "Landing");
        assert_eq!(value["nodes"][0]["type"], "CANVAS");
        assert!(value["globalVars"]["styles"].is_object());
    }
}
