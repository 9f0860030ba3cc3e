//! Paint to CSS conversion.

use figma_client::models::{Color, ColorStop, Paint, Vector};

use super::node::{ImageDownloadArguments, ImageFill, SimplifiedFill};
use super::style_table::short_hash;

/// Convert a paint layer. Returns `None` for hidden or unsupported paints.
pub fn simplify_paint(paint: &Paint) -> Option<SimplifiedFill> {
    if !paint.visible {
        return None;
    }
    let opacity = paint.opacity.unwrap_or(1.0);
    match paint.paint_type.as_str() {
        "SOLID" => paint
            .color
            .map(|color| SimplifiedFill::Css(css_color(&color, opacity))),
        "GRADIENT_LINEAR" => Some(SimplifiedFill::Css(linear_gradient(paint, opacity))),
        "GRADIENT_RADIAL" => Some(SimplifiedFill::Css(format!(
            "radial-gradient(circle at {}, {})",
            center(paint),
            stops(&paint.gradient_stops, opacity)
        ))),
        "GRADIENT_ANGULAR" => Some(SimplifiedFill::Css(format!(
            "conic-gradient(from {}deg at {}, {})",
            round2(handle_angle(paint)),
            center(paint),
            stops(&paint.gradient_stops, opacity)
        ))),
        "GRADIENT_DIAMOND" => Some(SimplifiedFill::Css(format!(
            "radial-gradient(ellipse at {}, {})",
            center(paint),
            stops(&paint.gradient_stops, opacity)
        ))),
        "IMAGE" => paint.image_ref.as_ref().map(|image_ref| {
            SimplifiedFill::Image(image_fill(paint, image_ref.clone()))
        }),
        _ => None,
    }
}

/// `#RRGGBB` when fully opaque, `rgba(r, g, b, a)` otherwise.
pub fn css_color(color: &Color, opacity: f64) -> String {
    let alpha = round2(color.a * opacity);
    let r = channel(color.r);
    let g = channel(color.g);
    let b = channel(color.b);
    if alpha >= 1.0 {
        format!("#{r:02X}{g:02X}{b:02X}")
    } else {
        format!("rgba({r}, {g}, {b}, {alpha})")
    }
}

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn stops(stops: &[ColorStop], opacity: f64) -> String {
    stops
        .iter()
        .map(|stop| {
            format!(
                "{} {}%",
                css_color(&stop.color, opacity),
                round2(stop.position * 100.0)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn handle(paint: &Paint, index: usize) -> Vector {
    paint
        .gradient_handle_positions
        .get(index)
        .copied()
        .unwrap_or_default()
}

fn center(paint: &Paint) -> String {
    let c = handle(paint, 0);
    format!("{}% {}%", round2(c.x * 100.0), round2(c.y * 100.0))
}

/// Angle of the first handle axis in CSS degrees (0deg points up).
fn handle_angle(paint: &Paint) -> f64 {
    let start = handle(paint, 0);
    let end = handle(paint, 1);
    let degrees = (end.y - start.y).atan2(end.x - start.x).to_degrees() + 90.0;
    degrees.rem_euclid(360.0)
}

fn linear_gradient(paint: &Paint, opacity: f64) -> String {
    format!(
        "linear-gradient({}deg, {})",
        round2(handle_angle(paint)),
        stops(&paint.gradient_stops, opacity)
    )
}

fn image_fill(paint: &Paint, image_ref: String) -> ImageFill {
    let scale_mode = paint.scale_mode.clone().unwrap_or_else(|| "FILL".to_string());
    let mut fill = ImageFill {
        fill_type: "IMAGE",
        image_ref,
        scale_mode: scale_mode.clone(),
        object_fit: None,
        background_size: None,
        background_repeat: None,
        image_download_arguments: ImageDownloadArguments::default(),
    };

    match scale_mode.as_str() {
        "FIT" => fill.object_fit = Some("contain".to_string()),
        "CROP" => {
            fill.object_fit = Some("cover".to_string());
            let args = &mut fill.image_download_arguments;
            args.needs_cropping = true;
            if let Some(transform) = &paint.image_transform {
                args.filename_suffix = Some(transform_suffix(transform));
                args.crop_transform = Some(transform.clone());
            }
        }
        "TILE" => {
            fill.background_repeat = Some("repeat".to_string());
            let factor = paint.scaling_factor.unwrap_or(1.0);
            fill.background_size = Some(format!(
                "calc(var(--original-width) * {}) calc(var(--original-height) * {})",
                round2(factor),
                round2(factor)
            ));
            fill.image_download_arguments.requires_image_dimensions = true;
        }
        _ => fill.object_fit = Some("cover".to_string()),
    }
    fill
}

/// Short lower-case tag derived from a crop matrix, so distinct crops of one
/// bitmap get distinct file names.
fn transform_suffix(transform: &[Vec<f64>]) -> String {
    let text = transform
        .iter()
        .flatten()
        .map(|v| round2(*v).to_string())
        .collect::<Vec<_>>()
        .join(",");
    short_hash(&text).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(r: f64, g: f64, b: f64, a: f64) -> Paint {
        Paint {
            paint_type: "SOLID".to_string(),
            visible: true,
            color: Some(Color { r, g, b, a }),
            ..Default::default()
        }
    }

    fn image(scale_mode: &str) -> Paint {
        Paint {
            paint_type: "IMAGE".to_string(),
            visible: true,
            image_ref: Some("abc123".to_string()),
            scale_mode: Some(scale_mode.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_solid_hex() {
        assert_eq!(
            simplify_paint(&solid(1.0, 0.0, 0.0, 1.0)),
            Some(SimplifiedFill::Css("#FF0000".to_string()))
        );
    }

    #[test]
    fn test_solid_rgba_with_paint_opacity() {
        let mut paint = solid(0.0, 0.0, 1.0, 1.0);
        paint.opacity = Some(0.5);
        assert_eq!(
            simplify_paint(&paint),
            Some(SimplifiedFill::Css("rgba(0, 0, 255, 0.5)".to_string()))
        );
    }

    #[test]
    fn test_hidden_paint_dropped() {
        let mut paint = solid(1.0, 1.0, 1.0, 1.0);
        paint.visible = false;
        assert_eq!(simplify_paint(&paint), None);
    }

    #[test]
    fn test_linear_gradient() {
        let paint = Paint {
            paint_type: "GRADIENT_LINEAR".to_string(),
            visible: true,
            gradient_handle_positions: vec![Vector { x: 0.5, y: 0.0 }, Vector { x: 0.5, y: 1.0 }],
            gradient_stops: vec![
                ColorStop {
                    position: 0.0,
                    color: Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 },
                },
                ColorStop {
                    position: 1.0,
                    color: Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 },
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            simplify_paint(&paint),
            Some(SimplifiedFill::Css(
                "linear-gradient(180deg, #FFFFFF 0%, #000000 100%)".to_string()
            ))
        );
    }

    #[test]
    fn test_image_fill_modes() {
        let Some(SimplifiedFill::Image(fill)) = simplify_paint(&image("FILL")) else {
            panic!("expected image fill");
        };
        assert_eq!(fill.object_fit.as_deref(), Some("cover"));
        assert!(!fill.image_download_arguments.needs_cropping);

        let Some(SimplifiedFill::Image(fill)) = simplify_paint(&image("TILE")) else {
            panic!("expected image fill");
        };
        assert!(fill.image_download_arguments.requires_image_dimensions);
        assert_eq!(fill.background_repeat.as_deref(), Some("repeat"));
    }

    #[test]
    fn test_crop_sets_download_arguments() {
        let mut paint = image("CROP");
        paint.image_transform = Some(vec![vec![0.5, 0.0, 0.25], vec![0.0, 0.5, 0.25]]);
        let Some(SimplifiedFill::Image(fill)) = simplify_paint(&paint) else {
            panic!("expected image fill");
        };
        let args = fill.image_download_arguments;
        assert!(args.needs_cropping);
        assert_eq!(args.crop_transform, paint.image_transform);
        let suffix = args.filename_suffix.unwrap();
        assert_eq!(suffix.len(), 6);

        let mut other = image("CROP");
        other.image_transform = Some(vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.5, 0.5]]);
        let Some(SimplifiedFill::Image(other_fill)) = simplify_paint(&other) else {
            panic!("expected image fill");
        };
        assert_ne!(other_fill.image_download_arguments.filename_suffix, Some(suffix));
    }
}
