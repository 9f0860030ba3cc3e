//! Collapse image export requests into the minimal set of downloads.
//!
//! Image fills are keyed by `(image_ref, filename_suffix)`:
//!
//! - an unsuffixed request joins the earlier unsuffixed record for the same
//!   `image_ref`, adding its file name and OR-ing the crop and dimension flags,
//! - a suffixed request always opens its own record, with the suffix spliced
//!   into the file name,
//! - rendered-node requests are never merged.

use std::collections::HashMap;
use std::fmt;

use figma_client::ImageFormat;

use crate::request::{CropTransform, ImageExportRequest, ImageSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    ImageFill { image_ref: String },
    RenderedNode { node_id: String, format: ImageFormat },
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageFill { image_ref } => write!(f, "image fill {image_ref}"),
            Self::RenderedNode { node_id, format } => write!(f, "node {node_id} ({format})"),
        }
    }
}

/// One file to fetch, shared by every request that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub target: DownloadTarget,
    /// Requesting output names, in request order. Never empty.
    pub file_names: Vec<String>,
    pub needs_cropping: bool,
    pub crop_transform: Option<CropTransform>,
    pub requires_image_dimensions: bool,
}

impl DownloadRecord {
    /// Name the file is stored under locally.
    pub fn primary_file_name(&self) -> &str {
        self.file_names.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadPlan {
    pub records: Vec<DownloadRecord>,
}

impl DownloadPlan {
    pub fn has_fills(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.target, DownloadTarget::ImageFill { .. }))
    }

    /// Node ids to render in `format`, in plan order.
    pub fn render_ids(&self, format: ImageFormat) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| match &r.target {
                DownloadTarget::RenderedNode { node_id, format: f } if *f == format => {
                    Some(node_id.clone())
                }
                _ => None,
            })
            .collect()
    }
}

pub fn plan_downloads(requests: &[ImageExportRequest]) -> DownloadPlan {
    let mut records: Vec<DownloadRecord> = Vec::with_capacity(requests.len());
    let mut unsuffixed: HashMap<&str, usize> = HashMap::new();

    for request in requests {
        match &request.source {
            ImageSource::Fill {
                image_ref,
                filename_suffix: None,
            } => {
                if let Some(&index) = unsuffixed.get(image_ref.as_str()) {
                    let record = &mut records[index];
                    record.file_names.push(request.file_name.clone());
                    record.needs_cropping |= request.needs_cropping;
                    record.requires_image_dimensions |= request.requires_image_dimensions;
                    if record.crop_transform.is_none() {
                        record.crop_transform = request.crop_transform;
                    }
                    continue;
                }
                unsuffixed.insert(image_ref.as_str(), records.len());
                records.push(record_for(
                    request,
                    DownloadTarget::ImageFill {
                        image_ref: image_ref.clone(),
                    },
                    request.file_name.clone(),
                ));
            }
            ImageSource::Fill {
                image_ref,
                filename_suffix: Some(suffix),
            } => records.push(record_for(
                request,
                DownloadTarget::ImageFill {
                    image_ref: image_ref.clone(),
                },
                apply_suffix(&request.file_name, suffix),
            )),
            ImageSource::Render { node_id, format } => records.push(record_for(
                request,
                DownloadTarget::RenderedNode {
                    node_id: node_id.clone(),
                    format: *format,
                },
                request.file_name.clone(),
            )),
        }
    }

    DownloadPlan { records }
}

fn record_for(
    request: &ImageExportRequest,
    target: DownloadTarget,
    file_name: String,
) -> DownloadRecord {
    DownloadRecord {
        target,
        file_names: vec![file_name],
        needs_cropping: request.needs_cropping,
        crop_transform: request.crop_transform,
        requires_image_dimensions: request.requires_image_dimensions,
    }
}

/// Splice `suffix` before the extension (`hero.png` -> `hero-a1b2c3.png`),
/// unless the name already contains it.
pub fn apply_suffix(file_name: &str, suffix: &str) -> String {
    if file_name.contains(suffix) {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{suffix}.{ext}"),
        None => format!("{file_name}-{suffix}"),
    }
}
