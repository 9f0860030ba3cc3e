//! Fetch and simplify a design for the data tool.

use figma_client::FigmaApi;
use tracing::{info, Instrument};

use crate::context::InvocationContext;
use crate::error::{SdkError, SdkResult};
use crate::request::GetFigmaDataRequest;
use crate::simplify::{simplify_file, simplify_nodes, SimplifiedDesign, SimplifyOptions};

/// One API call (file or node lookup), then one simplification pass. The
/// request depth bounds both the API response and the traversal.
pub async fn fetch_design(
    ctx: &InvocationContext,
    api: &dyn FigmaApi,
    request: &GetFigmaDataRequest,
) -> SdkResult<SimplifiedDesign> {
    let options = SimplifyOptions::default().with_max_depth(request.depth);

    let design = match &request.node_id {
        Some(node_id) => {
            let response = api
                .get_nodes(&request.file_key, node_id, request.depth)
                .instrument(ctx.span().clone())
                .await?;
            if !matches!(response.nodes.get(node_id), Some(Some(_))) {
                return Err(SdkError::NodeNotFound {
                    file_key: request.file_key.clone(),
                    node_id: node_id.clone(),
                });
            }
            simplify_nodes(&response, &options)
        }
        None => {
            let file = api
                .get_file(&request.file_key, request.depth)
                .instrument(ctx.span().clone())
                .await?;
            simplify_file(&file, &options)
        }
    };

    info!(
        parent: ctx.span(),
        file_key = %request.file_key,
        node_id = request.node_id.as_deref().unwrap_or("-"),
        nodes = design.nodes.len(),
        styles = design.global_vars.styles.len(),
        "Design fetched"
    );
    Ok(design)
}
