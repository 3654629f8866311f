//! MCP error types.

use rmcp::ErrorData;
use rmcp::service::ServiceError;
use thiserror::Error;

use crate::protocol;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("initialize handshake failed: {0}")]
    Handshake(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("session closed")]
    Closed,

    #[error("timeout waiting for response")]
    Timeout,

    #[error("JSON-RPC error [{code}]: {message}")]
    Rpc {
        code: i32,
        message: String,
        reason: Option<String>,
    },

    #[error("unexpected service failure: {0}")]
    Service(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("tool registered twice: {0}")]
    DuplicateTool(String),

    #[error("invalid input schema for {tool}: {reason}")]
    InvalidSchema { tool: String, reason: String },
}

impl Error {
    /// Whether the session with the tool host is gone.
    ///
    /// A lost connection cannot serve further requests; everything else
    /// leaves the session usable.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. }
                | Self::Io(_)
                | Self::Handshake(_)
                | Self::Transport(_)
                | Self::Closed
        )
    }

    /// Whether this error comes from the transport rather than a tool.
    pub fn is_connection_error(&self) -> bool {
        self.is_connection_lost() || matches!(self, Self::Timeout | Self::Service(_))
    }
}

impl From<ErrorData> for Error {
    fn from(e: ErrorData) -> Self {
        Self::Rpc {
            code: e.code.0,
            reason: protocol::reason(&e).map(str::to_string),
            message: e.message.into_owned(),
        }
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::McpError(data) => data.into(),
            ServiceError::TransportClosed => Self::Closed,
            send @ ServiceError::TransportSend(_) => Self::Transport(send.to_string()),
            other => Self::Service(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
