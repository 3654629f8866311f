use crate::model::ModelError;
use crate::tools::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("not connected to a tool host")]
    NotConnected,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("tool error: {0}")]
    Tool(ToolError),
}

impl From<ToolError> for Error {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::Disconnected(reason) => Self::Connection(reason),
            ToolError::Timeout(ms) => Self::Timeout(format!("tool call after {ms}ms")),
            e => Self::Tool(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
