//! Query orchestration between a completion model and a tool host.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::time::timeout;

use crate::decision::{self, Decision, DecisionMode};
use crate::error::{Error, Result};
use crate::model::{
    Backend, Message, ModelRequest, ModelResponse, Part, ToolCall, ToolChoice, ToolResult,
    ToolSpec,
};
use crate::tools::ToolHost;

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connected,
    AwaitingModelDecision,
    /// The last query finished. The next one starts from `Connected`.
    Done,
}

/// Upper bounds for each external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub handshake: Duration,
    pub model: Duration,
    pub tool: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            handshake: Duration::from_secs(15),
            model: Duration::from_secs(60),
            tool: Duration::from_secs(30),
        }
    }
}

/// How a reply came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyKind {
    /// The model answered without tools.
    Direct,
    /// One tool ran and the model answered from its result.
    /// `failed` is set when the tool result was an error.
    ToolAssisted { tool: String, failed: bool },
    /// The model output could not be mapped to an action.
    Unresolved,
}

/// Answer to one user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

impl Reply {
    fn direct(text: String) -> Self {
        Self {
            text,
            kind: ReplyKind::Direct,
        }
    }

    fn unresolved(raw: &str) -> Self {
        Self {
            text: format!("could not resolve model output to an action: {raw}"),
            kind: ReplyKind::Unresolved,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs queries against one model backend and one tool host session.
///
/// Each query fetches the catalog, asks the model for a decision, performs
/// at most one tool invocation and asks the model for the final answer.
pub struct Orchestrator<B, H> {
    backend: B,
    host: Option<H>,
    mode: DecisionMode,
    timeouts: Timeouts,
    state: State,
}

impl<B: Backend, H: ToolHost> Orchestrator<B, H> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            host: None,
            mode: DecisionMode::default(),
            timeouts: Timeouts::default(),
            state: State::Disconnected,
        }
    }

    pub fn with_mode(mut self, mode: DecisionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Adopt a host session that has already completed its handshake.
    pub fn attach(&mut self, host: H) {
        self.host = Some(host);
        self.state = State::Connected;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn mode(&self) -> DecisionMode {
        self.mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    /// Answer one user query.
    ///
    /// Tool failures are shown to the model and still produce a reply.
    /// Transport failures, timeouts and model errors end the query with `Err`;
    /// losing the connection also drops the session.
    pub async fn process_query(&mut self, query: &str) -> Result<Reply> {
        if self.host.is_none() {
            return Err(Error::NotConnected);
        }

        tracing::info!(mode = ?self.mode, "processing query");
        let outcome = self.run(query).await;

        match &outcome {
            Ok(reply) => {
                tracing::info!(kind = ?reply.kind, "query answered");
                self.state = State::Done;
            }
            Err(Error::Connection(reason)) => {
                tracing::warn!(%reason, "tool host connection lost");
                if let Some(host) = self.host.take() {
                    let _ = host.close().await;
                }
                self.state = State::Disconnected;
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                self.state = State::Connected;
            }
        }
        outcome
    }

    /// [`Orchestrator::process_query`] for callers outside the async runtime.
    ///
    /// Must not be called from within an async task on the same runtime.
    pub fn process_query_blocking(&mut self, handle: &Handle, query: &str) -> Result<Reply> {
        handle.block_on(self.process_query(query))
    }

    /// Close the host session. Safe to call repeatedly and after failures.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.state = State::Disconnected;
        let Some(host) = self.host.take() else {
            return Ok(());
        };
        tracing::debug!("shutting down tool host session");
        host.close().await.map_err(Error::from)
    }

    async fn run(&mut self, query: &str) -> Result<Reply> {
        let tools = self.list_tools().await?;
        tracing::debug!(count = tools.len(), "catalog fetched");

        self.state = State::AwaitingModelDecision;
        match self.mode {
            DecisionMode::Structured => self.run_structured(query, &tools).await,
            DecisionMode::Text => self.run_text(query, &tools).await,
        }
    }

    async fn run_structured(&self, query: &str, tools: &[ToolSpec]) -> Result<Reply> {
        let mut messages = vec![Message::user(query)];
        let response = self.complete(&messages, tools, ToolChoice::Auto).await?;

        let call = match decision::resolve_structured(&response.message) {
            Decision::Answer(text) => return Ok(Reply::direct(text)),
            Decision::Unresolved(raw) => return Ok(Reply::unresolved(&raw)),
            Decision::Invoke(call) => call,
        };

        let result = self.invoke(&call).await?;
        let failed = result.is_error();

        // Keep only the invoked call so every tool call in history has a result.
        let mut assistant = response.message;
        assistant
            .parts
            .retain(|part| !matches!(part, Part::ToolCall(other) if other.id != call.id));
        messages.push(assistant);
        messages.push(Message::tool_results(vec![result]));

        let last = self.complete(&messages, tools, ToolChoice::None).await?;
        Ok(Reply {
            text: last.message.text(),
            kind: ReplyKind::ToolAssisted {
                tool: call.name,
                failed,
            },
        })
    }

    async fn run_text(&self, query: &str, tools: &[ToolSpec]) -> Result<Reply> {
        let prompt = decision::text_prompt(query, tools);
        let response = self
            .complete(&[Message::user(prompt)], &[], ToolChoice::None)
            .await?;
        let raw = response.message.text();

        let call = match decision::parse_text_decision(&raw) {
            Decision::Answer(text) => return Ok(Reply::direct(text)),
            Decision::Unresolved(raw) => {
                tracing::warn!("model output is not a valid decision");
                return Ok(Reply::unresolved(&raw));
            }
            Decision::Invoke(call) => call,
        };

        let result = self.invoke(&call).await?;
        let failed = result.is_error();
        let output = match &result {
            ToolResult::Success { .. } => result.content(),
            ToolResult::Failure { .. } => format!("error: {}", result.content()),
        };

        let prompt = decision::final_prompt(query, &call.name, &output);
        let last = self
            .complete(&[Message::user(prompt)], &[], ToolChoice::None)
            .await?;
        Ok(Reply {
            text: last.message.text(),
            kind: ReplyKind::ToolAssisted {
                tool: call.name,
                failed,
            },
        })
    }

    fn connected_host(&self) -> Result<&H> {
        self.host.as_ref().ok_or(Error::NotConnected)
    }

    async fn list_tools(&self) -> Result<Vec<ToolSpec>> {
        let host = self.connected_host()?;
        timeout(self.timeouts.tool, host.list_tools())
            .await
            .map_err(|_| Error::Timeout(format!("tools/list after {:?}", self.timeouts.tool)))?
            .map_err(Error::from)
    }

    /// Run one tool call. Reportable failures become a failed result.
    async fn invoke(&self, call: &ToolCall) -> Result<ToolResult> {
        let host = self.connected_host()?;
        let arguments = match &call.input {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        tracing::info!(tool = %call.name, "invoking tool");
        let outcome = timeout(self.timeouts.tool, host.call_tool(&call.name, arguments))
            .await
            .map_err(|_| {
                Error::Timeout(format!("tool {} after {:?}", call.name, self.timeouts.tool))
            })?;

        match outcome {
            Ok(output) => Ok(ToolResult::Success {
                tool_call_id: call.id.clone(),
                output: Value::String(output),
            }),
            Err(e) if e.is_reportable() => {
                tracing::warn!(tool = %call.name, error = %e, "tool failed, reporting to model");
                Ok(ToolResult::Failure {
                    tool_call_id: call.id.clone(),
                    error: e,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
    ) -> Result<ModelResponse> {
        let request = ModelRequest {
            messages,
            tools,
            tool_choice,
        };
        let response = timeout(self.timeouts.model, self.backend.call(request))
            .await
            .map_err(|_| Error::Timeout(format!("model call after {:?}", self.timeouts.model)))??;
        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model responded"
        );
        Ok(response)
    }
}

impl<B: Backend> Orchestrator<B, mcp::Client> {
    /// Spawn or dial the tool host and complete the handshake.
    ///
    /// Any existing session is closed first.
    pub async fn connect(&mut self, config: mcp::ServerConfig) -> Result<()> {
        self.shutdown().await?;

        let name = config.name.clone();
        let client = timeout(self.timeouts.handshake, mcp::Client::connect(config))
            .await
            .map_err(|_| {
                Error::Timeout(format!("handshake with {name} after {:?}", self.timeouts.handshake))
            })?
            .map_err(|e| Error::Connection(e.to_string()))?;

        self.attach(client);
        Ok(())
    }
}
