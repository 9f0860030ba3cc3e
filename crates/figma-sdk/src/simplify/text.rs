use figma_client::models::TypeStyle;

use super::node::TextStyle;
use super::paint::round2;

/// Line height in `em` and letter spacing in `%`, both relative to the font size.
pub fn simplify_text_style(style: &TypeStyle) -> TextStyle {
    let size = style.font_size.filter(|s| *s > 0.0);
    TextStyle {
        font_family: style.font_family.clone(),
        font_weight: style.font_weight,
        font_size: style.font_size,
        line_height: match (style.line_height_px, size) {
            (Some(px), Some(size)) => Some(format!("{}em", round2(px / size))),
            _ => None,
        },
        letter_spacing: match (style.letter_spacing, size) {
            (Some(spacing), Some(size)) if spacing != 0.0 => {
                Some(format!("{}%", round2(spacing / size * 100.0)))
            }
            _ => None,
        },
        text_case: style.text_case.clone(),
        text_align_horizontal: style.text_align_horizontal.clone(),
        text_align_vertical: style.text_align_vertical.clone(),
    }
}
