//! MCP-backed tool host.

use std::time::Duration;

use super::{ToolError, ToolHost};
use crate::model::ToolSpec;
use serde_json::{Map, Value};

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn tool_error(timeout: Duration, e: mcp::Error) -> ToolError {
    match e {
        mcp::Error::ToolNotFound(name) => ToolError::NotFound(name),
        mcp::Error::InvalidArguments { tool, reason } => {
            ToolError::InvalidInput(format!("{tool}: {reason}"))
        }
        mcp::Error::ToolCallFailed(text) => ToolError::Execution(text),
        rpc @ mcp::Error::Rpc { .. } => ToolError::Execution(rpc.to_string()),
        mcp::Error::Timeout => ToolError::Timeout(millis(timeout)),
        e if e.is_connection_lost() => ToolError::Disconnected(e.to_string()),
        e => ToolError::Transport(e.to_string()),
    }
}

impl ToolHost for mcp::Client {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let tools = mcp::Client::list_tools(self)
            .await
            .map_err(|e| tool_error(self.timeout(), e))?;
        Ok(tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, ToolError> {
        let result = mcp::Client::call_tool(self, name, arguments)
            .await
            .map_err(|e| tool_error(self.timeout(), e))?;
        mcp::first_text(&result)
            .map(str::to_string)
            .ok_or_else(|| ToolError::Execution(format!("{name} returned no text content")))
    }

    async fn close(&self) -> Result<(), ToolError> {
        mcp::Client::close(self)
            .await
            .map_err(|e| tool_error(self.timeout(), e))
    }
}
