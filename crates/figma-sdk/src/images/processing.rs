//! Post-download processing: crop, measure, and emit CSS variables.
//!
//! Everything here is blocking file and pixel work; async callers run it on
//! the blocking pool.

use std::path::Path;

use image::{ImageFormat, ImageReader};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::ImageError;
use crate::request::CropTransform;

static SVG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<svg\b[^>]*>").unwrap());
static SVG_WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bwidth\s*=\s*["']([0-9.]+)(?:px)?["']"#).unwrap());
static SVG_HEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bheight\s*=\s*["']([0-9.]+)(?:px)?["']"#).unwrap());
static SVG_VIEWBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bviewBox\s*=\s*["']\s*[-0-9.]+[\s,]+[-0-9.]+[\s,]+([0-9.]+)[\s,]+([0-9.]+)\s*["']"#)
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub original_dimensions: ImageDimensions,
    pub final_dimensions: ImageDimensions,
    pub was_cropped: bool,
    pub css_variables: Option<String>,
}

/// Pixel rectangle selected by a Figma image transform on a `width` x `height`
/// bitmap. The translation picks the top-left corner and the scale picks the
/// visible fraction. Returns `None` when the region is empty.
pub fn crop_rect(width: u32, height: u32, transform: &CropTransform) -> Option<CropRect> {
    let [[scale_x, _, translate_x], [_, scale_y, translate_y]] = *transform;
    let (w, h) = (f64::from(width), f64::from(height));

    let left = (translate_x * w).round().max(0.0);
    let top = (translate_y * h).round().max(0.0);
    let crop_width = (scale_x * w).round().min(w - left);
    let crop_height = (scale_y * h).round().min(h - top);

    if crop_width <= 0.0 || crop_height <= 0.0 {
        return None;
    }
    Some(CropRect {
        left: left as u32,
        top: top as u32,
        width: crop_width as u32,
        height: crop_height as u32,
    })
}

pub fn css_variables(dimensions: ImageDimensions) -> String {
    format!(
        "--original-width: {}px; --original-height: {}px;",
        dimensions.width, dimensions.height
    )
}

/// Crop `path` in place when asked, then report its dimensions.
///
/// Rasters are decoded by content, not extension. Anything that is not
/// already PNG is rewritten as PNG to match its `.png` name.
pub fn process_image(
    path: &Path,
    needs_cropping: bool,
    crop_transform: Option<&CropTransform>,
    requires_image_dimensions: bool,
) -> Result<ProcessedImage, ImageError> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let (original_dimensions, final_dimensions, was_cropped) = if is_svg {
        let dimensions = match svg_dimensions(path) {
            Ok(dimensions) => dimensions,
            Err(e) if !requires_image_dimensions => {
                warn!(path = %path.display(), error = %e, "SVG size unknown, reporting 0x0");
                ImageDimensions { width: 0, height: 0 }
            }
            Err(e) => return Err(e),
        };
        (dimensions, dimensions, false)
    } else {
        process_raster(path, crop_transform.filter(|_| needs_cropping))?
    };

    let css_variables = requires_image_dimensions.then(|| css_variables(final_dimensions));
    debug!(
        path = %path.display(),
        width = final_dimensions.width,
        height = final_dimensions.height,
        was_cropped,
        "Image processed"
    );

    Ok(ProcessedImage {
        original_dimensions,
        final_dimensions,
        was_cropped,
        css_variables,
    })
}

fn decode_error(path: &Path, source: image::ImageError) -> ImageError {
    ImageError::Decode {
        path: path.display().to_string(),
        source,
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ImageError {
    ImageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Returns original dimensions, final dimensions and whether a crop applied.
fn process_raster(
    path: &Path,
    crop_transform: Option<&CropTransform>,
) -> Result<(ImageDimensions, ImageDimensions, bool), ImageError> {
    let reader = ImageReader::open(path)
        .map_err(|e| io_error(path, e))?
        .with_guessed_format()
        .map_err(|e| io_error(path, e))?;
    let format = reader.format();
    let is_png = format == Some(ImageFormat::Png);

    if is_png && crop_transform.is_none() {
        let (width, height) = reader.into_dimensions().map_err(|e| decode_error(path, e))?;
        let dimensions = ImageDimensions { width, height };
        return Ok((dimensions, dimensions, false));
    }

    let img = reader.decode().map_err(|e| decode_error(path, e))?;
    let original = ImageDimensions {
        width: img.width(),
        height: img.height(),
    };
    let rect = crop_transform
        .and_then(|t| crop_rect(original.width, original.height, t))
        .filter(|r| r.width != original.width || r.height != original.height);

    let img = match rect {
        Some(r) => img.crop_imm(r.left, r.top, r.width, r.height),
        None => img,
    };
    if !is_png {
        debug!(path = %path.display(), ?format, "Re-encoding as PNG");
    }
    if rect.is_some() || !is_png {
        img.save_with_format(path, ImageFormat::Png)
            .map_err(|e| decode_error(path, e))?;
    }

    Ok((
        original,
        ImageDimensions {
            width: img.width(),
            height: img.height(),
        },
        rect.is_some(),
    ))
}

fn svg_dimensions(path: &Path) -> Result<ImageDimensions, ImageError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    parse_svg_dimensions(&text).ok_or_else(|| ImageError::SvgDimensions {
        path: path.display().to_string(),
    })
}

fn parse_svg_dimensions(svg: &str) -> Option<ImageDimensions> {
    let tag = SVG_TAG_RE.find(svg)?.as_str();
    let capture = |re: &Regex| {
        re.captures(tag)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };

    let (width, height) = match (capture(&SVG_WIDTH_RE), capture(&SVG_HEIGHT_RE)) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            let caps = SVG_VIEWBOX_RE.captures(tag)?;
            let w = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let h = caps.get(2)?.as_str().parse::<f64>().ok()?;
            (w, h)
        }
    };
    Some(ImageDimensions {
        width: width.round() as u32,
        height: height.round() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_crop_rect_math() {
        let rect = crop_rect(200, 100, &[[0.5, 0.0, 0.25], [0.0, 0.5, 0.5]]).unwrap();
        assert_eq!(
            rect,
            CropRect {
                left: 50,
                top: 50,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn test_crop_rect_clamped_to_bounds() {
        let rect = crop_rect(100, 100, &[[0.8, 0.0, 0.5], [0.0, 1.0, -0.1]]).unwrap();
        assert_eq!(rect.left, 50);
        assert_eq!(rect.top, 0);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 100);
    }

    #[test]
    fn test_crop_rect_empty() {
        assert!(crop_rect(100, 100, &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).is_none());
        assert!(crop_rect(100, 100, &[[0.5, 0.0, 1.0], [0.0, 0.5, 0.0]]).is_none());
    }

    #[test]
    fn test_css_variables() {
        assert_eq!(
            css_variables(ImageDimensions {
                width: 640,
                height: 480
            }),
            "--original-width: 640px; --original-height: 480px;"
        );
    }

    #[test]
    fn test_process_crops_png() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "photo.png", 40, 20);
        let processed =
            process_image(&path, true, Some(&[[0.5, 0.0, 0.0], [0.0, 0.5, 0.0]]), true).unwrap();
        assert!(processed.was_cropped);
        assert_eq!(processed.original_dimensions, ImageDimensions { width: 40, height: 20 });
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 20, height: 10 });
        assert_eq!(
            processed.css_variables.as_deref(),
            Some("--original-width: 20px; --original-height: 10px;")
        );
        assert_eq!(image::image_dimensions(&path).unwrap(), (20, 10));
    }

    #[test]
    fn test_process_without_crop() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "photo.png", 8, 6);
        let processed = process_image(&path, false, None, false).unwrap();
        assert!(!processed.was_cropped);
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 8, height: 6 });
        assert!(processed.css_variables.is_none());
    }

    #[test]
    fn test_identity_crop_is_not_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "photo.png", 8, 6);
        let processed =
            process_image(&path, true, Some(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]), false).unwrap();
        assert!(!processed.was_cropped);
    }

    #[test]
    fn test_svg_dimensions() {
        assert_eq!(
            parse_svg_dimensions(r#"<svg width="24" height="16px" xmlns="http://www.w3.org/2000/svg"></svg>"#),
            Some(ImageDimensions { width: 24, height: 16 })
        );
        assert_eq!(
            parse_svg_dimensions(r#"<?xml version="1.0"?><svg viewBox="0 0 48 32"></svg>"#),
            Some(ImageDimensions { width: 48, height: 32 })
        );
        assert_eq!(parse_svg_dimensions("<svg></svg>"), None);
    }

    #[test]
    fn test_svg_never_cropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icon.svg");
        std::fs::write(&path, r#"<svg width="10" height="10"></svg>"#).unwrap();
        let processed =
            process_image(&path, true, Some(&[[0.5, 0.0, 0.0], [0.0, 0.5, 0.0]]), true).unwrap();
        assert!(!processed.was_cropped);
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 10, height: 10 });
    }

    #[test]
    fn test_jpeg_named_png_is_reencoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, crate::testing::jpeg_bytes(30, 12)).unwrap();

        let processed = process_image(&path, false, None, true).unwrap();
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 30, height: 12 });
        assert!(!processed.was_cropped);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_jpeg_cropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, crate::testing::jpeg_bytes(40, 40)).unwrap();

        let processed =
            process_image(&path, true, Some(&[[0.5, 0.0, 0.5], [0.0, 0.25, 0.0]]), false).unwrap();
        assert!(processed.was_cropped);
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 20, height: 10 });
        assert_eq!(image::image_dimensions(&path).unwrap(), (20, 10));
    }

    #[test]
    fn test_unsized_svg_tolerated_unless_dimensions_required() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icon.svg");
        std::fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>").unwrap();

        let processed = process_image(&path, false, None, false).unwrap();
        assert_eq!(processed.final_dimensions, ImageDimensions { width: 0, height: 0 });
        assert!(processed.css_variables.is_none());

        let err = process_image(&path, false, None, true).unwrap_err();
        assert!(matches!(err, ImageError::SvgDimensions { .. }));
    }

    #[test]
    fn test_corrupt_png_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = process_image(&path, false, None, false).unwrap_err();
        assert_eq!(err.code(), "image_processing_error");
    }
}
