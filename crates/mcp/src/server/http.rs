//! Streamable HTTP endpoint (axum + rmcp's session manager).

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::ToolServer;
use crate::error::Result;

impl ToolServer {
    /// Routes: the MCP endpoint at `path`, `GET /health`.
    ///
    /// Each session runs on its own worker and is dropped after the
    /// configured idle period, or when the client sends `DELETE`.
    pub fn router(self, path: &str) -> Router {
        let mut sessions = LocalSessionManager::default();
        sessions.session_config.keep_alive = Some(self.session_idle);

        let server = self;
        let endpoint = StreamableHttpService::new(
            move || Ok(server.clone()),
            Arc::new(sessions),
            StreamableHttpServerConfig::default(),
        );

        Router::new()
            .nest_service(path, endpoint)
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve the endpoint on an already-bound listener until the task is
    /// dropped.
    pub async fn serve_http(self, listener: TcpListener, path: &str) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            server = %self.name,
            tools = self.registry.len(),
            idle = ?self.session_idle,
            %addr,
            path,
            "serving on streamable http"
        );

        axum::serve(listener, self.router(path)).await?;
        Ok(())
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
