//! Per-invocation logging context.
//!
//! Each tool call creates one [`InvocationContext`] at the server boundary and
//! passes it down explicitly. Operations log through its span instead of
//! consulting process-wide flags, so log lines from concurrent invocations
//! stay attributable.

use tracing::Span;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InvocationContext {
    tool: &'static str,
    invocation_id: Uuid,
    span: Span,
}

impl InvocationContext {
    pub fn new(tool: &'static str) -> Self {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("tool", tool, invocation_id = %invocation_id);
        Self {
            tool,
            invocation_id,
            span,
        }
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Span every log line of this invocation is recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }
}
