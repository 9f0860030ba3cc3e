//! Auto-layout and positioning to flexbox-style properties.

use figma_client::models::{Node, Vector};

use super::node::{Dimensions, LayoutSizing, SimplifiedLayout};
use super::paint::round2;

/// Build the layout description of `node`, given its parent in the raw tree.
/// Returns `None` when there is nothing worth recording.
pub fn simplify_layout(node: &Node, parent: Option<&Node>) -> Option<SimplifiedLayout> {
    let mode = match node.layout_mode.as_deref() {
        Some("HORIZONTAL") => "row",
        Some("VERTICAL") => "column",
        _ => "none",
    };
    let auto_layout = mode != "none";
    let parent_auto_layout = parent.is_some_and(is_auto_layout);
    let absolute = node.layout_positioning.as_deref() == Some("ABSOLUTE");

    let mut layout = SimplifiedLayout {
        mode: mode.to_string(),
        ..Default::default()
    };

    if auto_layout {
        layout.justify_content = node
            .primary_axis_align_items
            .as_deref()
            .and_then(justify_content);
        layout.align_items = if !node.children.is_empty()
            && node
                .children
                .iter()
                .all(|c| c.layout_align.as_deref() == Some("STRETCH"))
        {
            Some("stretch".to_string())
        } else {
            node.counter_axis_align_items
                .as_deref()
                .and_then(align_items)
        };
        layout.wrap = (node.layout_wrap.as_deref() == Some("WRAP")).then_some(true);
        layout.gap = node
            .item_spacing
            .filter(|gap| *gap > 0.0)
            .map(|gap| format!("{}px", round2(gap)));
        layout.padding = padding(node);
    }

    if parent_auto_layout && node.layout_align.as_deref() == Some("STRETCH") {
        layout.align_self = Some("stretch".to_string());
    }

    let sizing = LayoutSizing {
        horizontal: node.layout_sizing_horizontal.as_deref().and_then(sizing),
        vertical: node.layout_sizing_vertical.as_deref().and_then(sizing),
    };
    if sizing.horizontal.is_some() || sizing.vertical.is_some() {
        layout.sizing = Some(sizing.clone());
    }

    layout.overflow_scroll = match node.overflow_direction.as_deref() {
        Some("HORIZONTAL_SCROLLING") => Some(vec!["x".to_string()]),
        Some("VERTICAL_SCROLLING") => Some(vec!["y".to_string()]),
        Some("HORIZONTAL_AND_VERTICAL_SCROLLING") => Some(vec!["x".to_string(), "y".to_string()]),
        _ => None,
    };

    if absolute {
        layout.position = Some("absolute".to_string());
    }

    if let (Some(bounds), Some(parent_bounds)) = (
        node.absolute_bounding_box,
        parent.and_then(|p| p.absolute_bounding_box),
    ) {
        if absolute || !parent_auto_layout {
            layout.location_relative_to_parent = Some(Vector {
                x: round2(bounds.x - parent_bounds.x),
                y: round2(bounds.y - parent_bounds.y),
            });
        }
    }

    if let Some(bounds) = node.absolute_bounding_box {
        let fixed = |value: &Option<String>| !matches!(value.as_deref(), Some("fill" | "hug"));
        let dims = Dimensions {
            width: fixed(&sizing.horizontal).then_some(round2(bounds.width)),
            height: fixed(&sizing.vertical).then_some(round2(bounds.height)),
            aspect_ratio: (node.preserve_ratio == Some(true) && bounds.height > 0.0)
                .then(|| round2(bounds.width / bounds.height)),
        };
        if dims.width.is_some() || dims.height.is_some() || dims.aspect_ratio.is_some() {
            layout.dimensions = Some(dims);
        }
    }

    let empty = SimplifiedLayout {
        mode: "none".to_string(),
        ..Default::default()
    };
    (layout != empty).then_some(layout)
}

fn is_auto_layout(node: &Node) -> bool {
    matches!(node.layout_mode.as_deref(), Some("HORIZONTAL" | "VERTICAL"))
}

fn justify_content(value: &str) -> Option<String> {
    let css = match value {
        "MIN" => "flex-start",
        "MAX" => "flex-end",
        "CENTER" => "center",
        "SPACE_BETWEEN" => "space-between",
        _ => return None,
    };
    Some(css.to_string())
}

fn align_items(value: &str) -> Option<String> {
    let css = match value {
        "MIN" => "flex-start",
        "MAX" => "flex-end",
        "CENTER" => "center",
        "BASELINE" => "baseline",
        _ => return None,
    };
    Some(css.to_string())
}

fn sizing(value: &str) -> Option<String> {
    let css = match value {
        "FIXED" => "fixed",
        "FILL" => "fill",
        "HUG" => "hug",
        _ => return None,
    };
    Some(css.to_string())
}

fn padding(node: &Node) -> Option<String> {
    let top = node.padding_top.unwrap_or(0.0);
    let right = node.padding_right.unwrap_or(0.0);
    let bottom = node.padding_bottom.unwrap_or(0.0);
    let left = node.padding_left.unwrap_or(0.0);
    if top == 0.0 && right == 0.0 && bottom == 0.0 && left == 0.0 {
        return None;
    }
    Some(css_shorthand(top, right, bottom, left))
}

/// CSS four-side shorthand, collapsed where sides repeat.
pub(crate) fn css_shorthand(top: f64, right: f64, bottom: f64, left: f64) -> String {
    let px = |v: f64| format!("{}px", round2(v));
    if top == right && right == bottom && bottom == left {
        px(top)
    } else if top == bottom && right == left {
        format!("{} {}", px(top), px(right))
    } else if right == left {
        format!("{} {} {}", px(top), px(right), px(bottom))
    } else {
        format!("{} {} {} {}", px(top), px(right), px(bottom), px(left))
    }
}
