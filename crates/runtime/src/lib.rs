//! Relay runtime: model backends and query orchestration.
//!
//! The runtime sits between a completion model and a tool host:
//!
//! - **Backend**: a trait abstracting LLM providers (Anthropic, OpenAI).
//! - **ToolHost**: a trait over the tool host session; implemented for
//!   [`mcp::Client`].
//! - **Orchestrator**: answers a query by fetching the catalog, asking the
//!   model for a decision and running at most one tool.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{AnthropicBackend, Orchestrator};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnthropicBackend::builder("sk-ant-api01-...", "claude-sonnet-4-20250514").build();
//! let mut orchestrator = Orchestrator::new(backend);
//! orchestrator
//!     .connect(mcp::ServerConfig::stdio("relay", "relay", ["serve"]))
//!     .await?;
//!
//! let reply = orchestrator.process_query("What is 2 + 3?").await?;
//! println!("{reply}");
//!
//! orchestrator.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod decision;
mod error;
pub mod model;
mod orchestrator;
pub mod providers;
pub mod tools;

pub use decision::DecisionMode;
pub use error::{Error, Result};
pub use model::{Backend, Message, ModelError, ModelRequest, ModelResponse, ToolChoice, ToolSpec};
pub use orchestrator::{Orchestrator, Reply, ReplyKind, State, Timeouts};
pub use providers::{AnthropicBackend, OpenAiBackend, ProviderBackend};
pub use tools::{ToolError, ToolHost};
