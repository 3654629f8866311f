//! Tool host runtime: serves a [`ToolRegistry`] through rmcp.
//!
//! rmcp owns framing and the session lifecycle; [`ToolServer`] answers
//! `tools/list` and `tools/call` from the registry.

mod http;
mod registry;

pub use registry::{CallError, ToolFailure, ToolHandler, ToolRegistry, parse_arguments};

use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::IntoTransport;
use rmcp::{ErrorData, ServerHandler, ServiceExt};

use crate::error::{Error, Result};

/// How long an HTTP session may sit idle before the host drops it.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(300);

/// A tool host: server identity plus the tools it serves.
///
/// Cheap to clone; every HTTP session gets its own handle on the same
/// registry.
#[derive(Clone)]
pub struct ToolServer {
    name: String,
    registry: Arc<ToolRegistry>,
    session_idle: Duration,
}

impl ToolServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            registry: Arc::new(registry),
            session_idle: DEFAULT_SESSION_IDLE,
        }
    }

    /// Drop HTTP sessions that see no traffic for `idle`.
    pub fn with_session_idle(mut self, idle: Duration) -> Self {
        self.session_idle = idle;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve one session on the process's stdin/stdout until EOF.
    ///
    /// Nothing else may write to stdout while it runs.
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve_transport(rmcp::transport::stdio()).await
    }

    /// Serve one session over any rmcp transport until the peer hangs up.
    pub async fn serve_transport<T, E, A>(self, transport: T) -> Result<()>
    where
        T: IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let name = self.name.clone();
        let tools = self.registry.len();

        let service = self
            .serve(transport)
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;
        tracing::info!(server = %name, tools, "tool host session started");

        let reason = service.waiting().await.map_err(std::io::Error::other)?;
        tracing::info!(server = %name, ?reason, "tool host session ended");
        Ok(())
    }
}

impl ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = self.name.clone();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.registry.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let name = request.name.into_owned();
        let arguments = request.arguments.unwrap_or_default();
        tracing::debug!(tool = %name, "handling tools/call");

        // Handlers are synchronous and may touch the filesystem.
        let registry = Arc::clone(&self.registry);
        let outcome = tokio::task::spawn_blocking(move || registry.call(&name, &arguments))
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        outcome.map_err(ErrorData::from)
    }
}
