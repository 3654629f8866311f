//! Client session with a tool host (connect, discover, invoke, close).

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, CallToolResult, Tool};
use rmcp::service::{Peer, RoleClient, RunningService, ServiceError};
use rmcp::transport::{
    ConfigureCommandExt, IntoTransport, StreamableHttpClientTransport, TokioChildProcess,
};
use serde_json::{Map, Value};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::protocol;

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How to reach a tool host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Spawn the host as a subprocess and talk over its stdin/stdout.
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    /// Connect to a streamable HTTP endpoint.
    Http { url: String },
}

/// Configuration for a tool host connection.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub transport: TransportConfig,
    /// Applied to every request, the handshake included.
    pub timeout: Duration,
}

impl ServerConfig {
    /// A host spawned as a subprocess.
    pub fn stdio(
        name: impl Into<String>,
        command: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            transport: TransportConfig::Stdio {
                command: command.into(),
                args: args.into_iter().map(Into::into).collect(),
                env: HashMap::new(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A host behind a streamable HTTP endpoint.
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportConfig::Http { url: url.into() },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Handle to an initialized tool host session.
///
/// Dropping the client cancels the session; a spawned host is killed.
pub struct Client {
    name: String,
    timeout: Duration,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    catalog: Mutex<Vec<Tool>>,
    closed: AtomicBool,
}

impl Client {
    /// Open the transport and perform the initialize handshake.
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        let ServerConfig {
            name,
            transport,
            timeout,
        } = config;

        match transport {
            TransportConfig::Stdio { command, args, env } => {
                let process = Command::new(&command).configure(|cmd| {
                    cmd.args(&args).envs(&env).kill_on_drop(true);
                });
                let transport = TokioChildProcess::new(process).map_err(|source| Error::Spawn {
                    command: command.clone(),
                    source,
                })?;
                tracing::debug!(%command, ?args, "spawned tool host");
                Self::from_transport(name, transport, timeout).await
            }
            TransportConfig::Http { url } => {
                tracing::debug!(%url, "dialing tool host");
                let transport = StreamableHttpClientTransport::from_uri(url);
                Self::from_transport(name, transport, timeout).await
            }
        }
    }

    /// Run the initialize handshake over an already open transport.
    pub async fn from_transport<T, E, A>(
        name: impl Into<String>,
        transport: T,
        timeout: Duration,
    ) -> Result<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let name = name.into();
        let service = tokio::time::timeout(timeout, ().serve(transport))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::Handshake(e.to_string()))?;

        tracing::info!(
            server = %name,
            host = ?service.peer_info(),
            "tool host session initialized"
        );

        Ok(Self {
            name,
            timeout,
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            catalog: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether [`Client::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetch the catalog from the host.
    ///
    /// The result becomes the catalog that [`Client::call_tool`] checks
    /// names against.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.require_open()?;

        let result = self.bounded(self.peer.list_tools(Default::default())).await?;
        tracing::debug!(server = %self.name, count = result.tools.len(), "fetched catalog");

        *self.catalog.lock().await = result.tools.clone();
        Ok(result.tools)
    }

    /// The most recently fetched catalog.
    pub async fn catalog(&self) -> Vec<Tool> {
        self.catalog.lock().await.clone()
    }

    /// Call a tool by name.
    ///
    /// The name must appear in the most recently fetched catalog.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult> {
        self.require_open()?;

        let listed = self.catalog.lock().await.iter().any(|tool| tool.name == name);
        if !listed {
            return Err(Error::ToolNotFound(name.to_string()));
        }

        let params = CallToolRequestParams {
            name: name.to_string().into(),
            arguments: Some(arguments),
            meta: None,
            task: None,
        };

        tracing::debug!(server = %self.name, tool = name, "calling tool");
        let result = match self.bounded(self.peer.call_tool(params)).await {
            Ok(result) => result,
            Err(e) => return Err(classify_call_error(name, e)),
        };

        if result.is_error.unwrap_or(false) {
            return Err(Error::ToolCallFailed(protocol::joined_text(&result)));
        }
        Ok(result)
    }

    /// Shut down the session and release the transport.
    ///
    /// Calling it again is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        tracing::debug!(server = %self.name, "closing tool host session");
        let reason = service
            .cancel()
            .await
            .map_err(|e| Error::Service(e.to_string()))?;
        tracing::debug!(server = %self.name, ?reason, "tool host session closed");
        Ok(())
    }

    fn require_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = std::result::Result<T, ServiceError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(outcome) => outcome.map_err(Error::from),
            Err(_) => Err(Error::Timeout),
        }
    }
}

/// Turn a host-side `tools/call` rejection into a typed error.
fn classify_call_error(tool: &str, error: Error) -> Error {
    match error {
        Error::Rpc {
            reason: Some(reason),
            ..
        } if reason == protocol::REASON_TOOL_NOT_FOUND => Error::ToolNotFound(tool.to_string()),
        Error::Rpc {
            reason: Some(reason),
            message,
            ..
        } if reason == protocol::REASON_INVALID_ARGUMENTS => Error::InvalidArguments {
            tool: tool.to_string(),
            reason: message,
        },
        other => other,
    }
}
