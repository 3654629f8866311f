use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the tool host.
///
/// `NotFound`, `InvalidInput` and `Execution` are reported back to the model;
/// the rest end the query.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("timeout after {0}ms")]
    Timeout(u64),
    /// The session is gone; further calls cannot succeed.
    #[error("connection lost: {0}")]
    Disconnected(String),
    /// Protocol or transport failure on a live session.
    #[error("transport: {0}")]
    Transport(String),
}

impl ToolError {
    /// Whether the model should see this error as the tool's result.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidInput(_) | Self::Execution(_)
        )
    }
}
