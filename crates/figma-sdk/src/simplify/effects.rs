use figma_client::models::{Effect, Node};

use super::node::SimplifiedEffects;
use super::paint::{css_color, round2};

/// Collapse a node's visible effects into CSS properties. Shadows on text
/// nodes become `text-shadow`, which has no spread or inset form.
pub fn simplify_effects(node: &Node) -> SimplifiedEffects {
    let visible: Vec<&Effect> = node.effects.iter().filter(|e| e.visible).collect();
    let is_text = node.node_type == "TEXT";

    let shadows: Vec<String> = visible
        .iter()
        .filter_map(|effect| match effect.effect_type.as_str() {
            "DROP_SHADOW" => Some(shadow(effect, is_text, false)),
            "INNER_SHADOW" if !is_text => Some(shadow(effect, false, true)),
            _ => None,
        })
        .collect();

    let blur = |kind: &str| {
        let parts: Vec<String> = visible
            .iter()
            .filter(|e| e.effect_type == kind)
            .map(|e| format!("blur({}px)", round2(e.radius)))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    };

    let joined = (!shadows.is_empty()).then(|| shadows.join(", "));
    let (box_shadow, text_shadow) = if is_text {
        (None, joined)
    } else {
        (joined, None)
    };

    SimplifiedEffects {
        box_shadow,
        text_shadow,
        filter: blur("LAYER_BLUR"),
        backdrop_filter: blur("BACKGROUND_BLUR"),
    }
}

fn shadow(effect: &Effect, text: bool, inset: bool) -> String {
    let offset = effect.offset.unwrap_or_default();
    let color = effect
        .color
        .map(|c| css_color(&c, 1.0))
        .unwrap_or_else(|| "rgba(0, 0, 0, 0.25)".to_string());
    let mut parts = Vec::with_capacity(6);
    if inset {
        parts.push("inset".to_string());
    }
    parts.push(format!("{}px", round2(offset.x)));
    parts.push(format!("{}px", round2(offset.y)));
    parts.push(format!("{}px", round2(effect.radius)));
    if !text {
        parts.push(format!("{}px", round2(effect.spread.unwrap_or(0.0))));
    }
    parts.push(color);
    parts.join(" ")
}
