//! The agent abstraction shared by every pipeline stage.

use async_trait::async_trait;
use ideaforge_common::Result;

use crate::context::AnalysisContext;

/// A named role wrapping one or more model calls.
///
/// Agents read what they need from the context and return their own output.
/// They never write to the context; the orchestrator records each output
/// once the stage completes.
#[async_trait]
pub trait Agent: Send + Sync {
    type Output: Send;

    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Human-readable name, also the key for evaluation weights.
    fn name(&self) -> &str;

    async fn execute(&self, context: &AnalysisContext) -> Result<Self::Output>;
}
