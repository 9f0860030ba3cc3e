//! Shared helper functions for MCP tool implementations.

use figma_sdk::SdkError;
use rmcp::model::{CallToolResult, Content};

/// Build a structured error JSON string that LLMs can parse.
pub fn error_json(error_code: &str, message: &str) -> String {
    serde_json::json!({
        "error": error_code,
        "message": message,
    })
    .to_string()
}

/// Tool result flagged as an error, carrying [`error_json`] as its text.
pub fn error_result(error_code: &str, message: &str) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error_json(error_code, message))])
}

/// Map an sdk failure onto its error code.
pub fn sdk_error_result(error: &SdkError) -> CallToolResult {
    error_result(error.code(), &error.to_string())
}
