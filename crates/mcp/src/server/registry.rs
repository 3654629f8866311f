//! Tool registration, argument validation and execution.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use jsonschema::JSONSchema;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, Tool};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::protocol;

/// Error raised by a tool's own logic.
///
/// It never fails the JSON-RPC request: the host returns it as a result
/// with `isError: true`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ToolFailure(pub String);

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A named operation exposed by the tool host.
pub trait ToolHandler: Send + Sync {
    /// The descriptor published in the catalog.
    fn descriptor(&self) -> Tool;

    /// Run the tool. Arguments have already passed schema validation.
    fn call(&self, arguments: &Map<String, Value>) -> std::result::Result<String, ToolFailure>;
}

/// Deserialize validated arguments into a typed struct.
pub fn parse_arguments<T: DeserializeOwned>(
    arguments: &Map<String, Value>,
) -> std::result::Result<T, ToolFailure> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ToolFailure::new(format!("invalid arguments: {e}")))
}

/// Why a `tools/call` was rejected before the tool ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl From<CallError> for ErrorData {
    fn from(e: CallError) -> Self {
        let reason = match &e {
            CallError::NotFound(_) => protocol::REASON_TOOL_NOT_FOUND,
            CallError::InvalidArguments { .. } => protocol::REASON_INVALID_ARGUMENTS,
        };
        protocol::rejection(e.to_string(), reason)
    }
}

struct Entry {
    tool: Tool,
    schema: JSONSchema,
    handler: Arc<dyn ToolHandler>,
}

/// Ordered set of tools served by a host.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names must be unique and schemas must compile.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> Result<&mut Self> {
        let tool = handler.descriptor();

        if self.entries.iter().any(|e| e.tool.name == tool.name) {
            return Err(Error::DuplicateTool(tool.name.into_owned()));
        }

        let schema_value = Value::Object(tool.input_schema.as_ref().clone());
        let schema = JSONSchema::compile(&schema_value).map_err(|e| Error::InvalidSchema {
            tool: tool.name.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(tool = %tool.name, "registered tool");
        self.entries.push(Entry {
            tool,
            schema,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Builder form of [`ToolRegistry::register`].
    pub fn with(mut self, handler: impl ToolHandler + 'static) -> Result<Self> {
        self.register(handler)?;
        Ok(self)
    }

    /// Descriptors in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.tool.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and execute a call.
    ///
    /// Tool failures, panics included, come back as error results.
    pub fn call(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> std::result::Result<CallToolResult, CallError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.tool.name == name)
            .ok_or_else(|| CallError::NotFound(name.to_string()))?;

        let instance = Value::Object(arguments.clone());
        if let Err(errors) = entry.schema.validate(&instance) {
            let reason = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(CallError::InvalidArguments {
                tool: name.to_string(),
                reason,
            });
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| entry.handler.call(arguments)));
        let result = match outcome {
            Ok(Ok(text)) => CallToolResult::success(vec![Content::text(text)]),
            Ok(Err(failure)) => {
                tracing::warn!(tool = name, error = %failure, "tool failed");
                CallToolResult::error(vec![Content::text(failure.to_string())])
            }
            Err(_) => {
                tracing::error!(tool = name, "tool panicked");
                CallToolResult::error(vec![Content::text(format!("tool {name} panicked"))])
            }
        };
        Ok(result)
    }
}
