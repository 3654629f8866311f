//! Tool host trait.

use crate::model::ToolSpec;
use crate::tools::ToolError;
use serde_json::{Map, Value};
use std::future::Future;

/// Trait for tool execution hosts.
///
/// This is the boundary between the model loop and side effects.
/// Implementations must be initialized before either call is made.
pub trait ToolHost: Send + Sync {
    /// Fetch the current catalog.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolSpec>, ToolError>> + Send;

    /// Invoke a tool from the most recent catalog and return its text.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<String, ToolError>> + Send;

    /// Release the session. Must tolerate being called after a failure.
    fn close(&self) -> impl Future<Output = Result<(), ToolError>> + Send;
}
