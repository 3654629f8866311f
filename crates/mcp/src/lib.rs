//! MCP (Model Context Protocol) client and tool host library, built on the
//! rmcp SDK.
//!
//! The client side connects to a tool host over stdio or streamable HTTP,
//! discovers its tools and invokes them. The server side serves a
//! [`ToolRegistry`] over the same transports.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, ServerConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig::stdio("calculator", "relay", ["serve"]);
//! let client = Client::connect(config).await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let arguments = serde_json::json!({ "a": 2, "b": 3 });
//! let result = client
//!     .call_tool("add", arguments.as_object().cloned().unwrap_or_default())
//!     .await?;
//! println!("{}", mcp::first_text(&result).unwrap_or_default());
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;
pub mod server;

pub use client::{Client, DEFAULT_TIMEOUT, ServerConfig, TransportConfig};
pub use error::{Error, Result};
pub use protocol::{
    ProtocolVersion, REASON_INVALID_ARGUMENTS, REASON_TOOL_NOT_FOUND, first_text, joined_text,
    reason, schema,
};
pub use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
pub use server::{DEFAULT_SESSION_IDLE, ToolFailure, ToolHandler, ToolRegistry, ToolServer};
