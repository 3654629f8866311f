//! Configuration loading from relay.toml.

use runtime::{DecisionMode, Timeouts};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Completion model provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    OpenAi,
}

impl Provider {
    /// Environment variable holding the API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: Provider,

    /// Falls back to the provider's default model.
    pub model: Option<String>,

    pub decision: DecisionMode,

    pub max_tokens: u32,

    /// Override the provider endpoint (proxies, compatible servers).
    pub base_url: Option<String>,

    pub system: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            decision: DecisionMode::default(),
            max_tokens: 1024,
            base_url: None,
            system: None,
        }
    }
}

impl BackendConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// How the tool host is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTransport {
    #[default]
    Stdio,
    Http,
}

/// Tool host connection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub transport: HostTransport,

    /// Program to spawn for stdio. Defaults to the running executable.
    pub command: Option<String>,

    pub args: Vec<String>,

    pub url: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            transport: HostTransport::default(),
            command: None,
            args: vec!["serve".to_string()],
            url: "http://127.0.0.1:8050/mcp".to_string(),
        }
    }
}

impl HostConfig {
    /// Connection settings for the host client.
    pub fn server_config(&self, timeouts: &TimeoutConfig) -> mcp::ServerConfig {
        let config = match self.transport {
            HostTransport::Stdio => {
                let command = self.command.clone().unwrap_or_else(current_exe);
                mcp::ServerConfig::stdio("relay", command, self.args.iter().cloned())
            }
            HostTransport::Http => mcp::ServerConfig::http("relay", self.url.clone()),
        };
        config.with_timeout(timeouts.tool())
    }
}

fn current_exe() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path: PathBuf| path.to_str().map(str::to_string))
        .unwrap_or_else(|| "relay".to_string())
}

/// Per-call time limits, in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub handshake_secs: u64,
    pub model_secs: u64,
    pub tool_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            handshake_secs: 15,
            model_secs: 60,
            tool_secs: 30,
        }
    }
}

impl TimeoutConfig {
    fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }

    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            handshake: Duration::from_secs(self.handshake_secs),
            model: Duration::from_secs(self.model_secs),
            tool: self.tool(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}
