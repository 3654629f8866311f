//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The provider's API key is not in the environment.
    #[error("{var} is not set (export it or add it to .env)")]
    MissingApiKey { var: &'static str },

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred talking to or serving the tool host.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
