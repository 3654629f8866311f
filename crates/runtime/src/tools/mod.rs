//! Tool execution and MCP integration.

pub mod errors;
mod host;
mod mcp_host;

pub use errors::ToolError;
pub use host::ToolHost;
