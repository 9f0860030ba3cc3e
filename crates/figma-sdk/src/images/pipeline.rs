//! Download, process and upload planned images.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use figma_client::{ClientError, FigmaApi, ImageFormat, ObjectStorage, RenderOptions};
use serde::Serialize;
use tracing::{info, warn, Instrument};

use super::dedup::{plan_downloads, DownloadPlan, DownloadRecord, DownloadTarget};
use super::processing::{process_image, ImageDimensions, ProcessedImage};
use super::ImageError;
use crate::context::InvocationContext;
use crate::request::DownloadImagesRequest;

/// Outcome for one download record, reported once for all its file names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedImage {
    pub file_names: Vec<String>,
    pub file_path: String,
    pub final_dimensions: ImageDimensions,
    pub was_cropped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_variables: Option<String>,
    pub storage_url: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    pub requested: usize,
    pub downloaded: usize,
    pub images: Vec<DownloadedImage>,
}

/// Resolve URLs, then fetch, process and upload each record in turn. The
/// first failure aborts the batch; files already written stay on disk.
pub async fn download_images(
    ctx: &InvocationContext,
    api: &dyn FigmaApi,
    storage: Option<&dyn ObjectStorage>,
    request: &DownloadImagesRequest,
) -> Result<DownloadReport, ImageError> {
    let storage = storage.ok_or(ImageError::StorageNotConfigured)?;
    let plan = plan_downloads(&request.images);
    info!(
        parent: ctx.span(),
        file_key = %request.file_key,
        requested = request.images.len(),
        records = plan.records.len(),
        "Image download planned"
    );

    let urls = resolve_urls(ctx, api, request, &plan)
        .instrument(ctx.span().clone())
        .await?;

    let mut images = Vec::with_capacity(plan.records.len());
    for (record, url) in plan.records.iter().zip(urls) {
        let path = request.local_dir.join(record.primary_file_name());
        api.download(&url, &path).instrument(ctx.span().clone()).await?;

        let processed = run_processing(path.clone(), record).await?;

        let stored = storage
            .upload(&path)
            .instrument(ctx.span().clone())
            .await
            .map_err(|source| ImageError::Upload {
                path: path.display().to_string(),
                source,
            })?;
        info!(
            parent: ctx.span(),
            target = %record.target,
            key = %stored.key,
            "Image uploaded"
        );

        images.push(DownloadedImage {
            file_names: record.file_names.clone(),
            file_path: path.display().to_string(),
            final_dimensions: processed.final_dimensions,
            was_cropped: processed.was_cropped,
            css_variables: processed.css_variables,
            storage_url: stored.url,
            storage_key: stored.key,
        });
    }

    Ok(DownloadReport {
        requested: request.images.len(),
        downloaded: images.len(),
        images,
    })
}

/// One download URL per record, in record order.
async fn resolve_urls(
    ctx: &InvocationContext,
    api: &dyn FigmaApi,
    request: &DownloadImagesRequest,
    plan: &DownloadPlan,
) -> Result<Vec<String>, ImageError> {
    let fills = if plan.has_fills() {
        api.get_image_fills(&request.file_key).await?
    } else {
        BTreeMap::new()
    };

    let mut rendered: HashMap<(ImageFormat, String), Option<String>> = HashMap::new();
    for (format, options) in [
        (ImageFormat::Png, RenderOptions::png(request.png_scale)),
        (ImageFormat::Svg, RenderOptions::svg()),
    ] {
        let mut ids = plan.render_ids(format);
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            continue;
        }
        let urls = api
            .render_images(&request.file_key, &ids, &options)
            .await?;
        rendered.extend(urls.into_iter().map(|(id, url)| ((format, id), url)));
    }

    plan.records
        .iter()
        .map(|record| {
            let url = match &record.target {
                DownloadTarget::ImageFill { image_ref } => fills.get(image_ref).cloned(),
                DownloadTarget::RenderedNode { node_id, format } => rendered
                    .get(&(*format, node_id.clone()))
                    .cloned()
                    .flatten(),
            };
            url.ok_or_else(|| {
                warn!(parent: ctx.span(), target = %record.target, "No download URL");
                ImageError::Api(ClientError::invalid_response(
                    record.target.to_string(),
                    "Figma returned no download URL",
                ))
            })
        })
        .collect()
}

async fn run_processing(
    path: PathBuf,
    record: &DownloadRecord,
) -> Result<ProcessedImage, ImageError> {
    let needs_cropping = record.needs_cropping;
    let crop_transform = record.crop_transform;
    let requires_dimensions = record.requires_image_dimensions;
    tokio::task::spawn_blocking(move || {
        process_image(
            &path,
            needs_cropping,
            crop_transform.as_ref(),
            requires_dimensions,
        )
    })
    .await
    .map_err(|e| ImageError::Task(e.to_string()))?
}
