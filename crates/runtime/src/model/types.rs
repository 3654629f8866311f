use super::errors::ModelError;
use crate::tools::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// The result the runtime returned from a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success {
        tool_call_id: String,
        output: Value,
    },
    Failure {
        tool_call_id: String,
        error: ToolError,
    },
}

impl ToolResult {
    pub fn tool_call_id(&self) -> &str {
        match self {
            Self::Success { tool_call_id, .. } | Self::Failure { tool_call_id, .. } => {
                tool_call_id
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Text handed to the model: string output verbatim, anything else as
    /// JSON, failures as their error message.
    pub fn content(&self) -> String {
        match self {
            Self::Success {
                output: Value::String(text),
                ..
            } => text.clone(),
            Self::Success { output, .. } => output.to_string(),
            Self::Failure { error, .. } => error.to_string(),
        }
    }
}

/// A part of a message, which can be text or a tool interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A message, consisting of a role and one or more parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// A user message carrying tool results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            parts: results.into_iter().map(Part::ToolResult).collect(),
        }
    }

    /// Get combined text content from all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all tool calls from this message.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::ToolCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

/// A tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl From<mcp::Tool> for ToolSpec {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name.into_owned(),
            description: tool
                .description
                .map(|description| description.into_owned())
                .unwrap_or_default(),
            schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

/// Whether the model may call tools on this request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolChoice {
    #[default]
    Auto,
    /// Tools are described but must not be called.
    None,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for a model request.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
    pub tool_choice: ToolChoice,
}

/// The response from a model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Message,
    pub usage: Usage,
}

/// Trait for LLM provider backends.
pub trait Backend: Send + Sync {
    fn call(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_text_extraction() {
        let msg = Message {
            role: Role::Assistant,
            parts: vec![
                Part::Text("Hello ".into()),
                Part::ToolCall(ToolCall {
                    id: "1".into(),
                    name: "test".into(),
                    input: Value::Null,
                }),
                Part::Text("world".into()),
            ],
        };
        assert_eq!(msg.text(), "Hello world");
    }

    #[test]
    fn message_tool_calls_extraction() {
        let msg = Message {
            role: Role::Assistant,
            parts: vec![
                Part::Text("Let me help".into()),
                Part::ToolCall(ToolCall {
                    id: "1".into(),
                    name: "add".into(),
                    input: json!({"a": 1, "b": 2}),
                }),
                Part::ToolCall(ToolCall {
                    id: "2".into(),
                    name: "mul".into(),
                    input: json!({"c": 3, "d": 4}),
                }),
            ],
        };
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "add");
        assert_eq!(calls[1].name, "mul");
    }

    #[test]
    fn tool_result_content() {
        let ok = ToolResult::Success {
            tool_call_id: "1".into(),
            output: Value::String("5".into()),
        };
        assert_eq!(ok.content(), "5");
        assert!(!ok.is_error());

        let failed = ToolResult::Failure {
            tool_call_id: "2".into(),
            error: ToolError::NotFound("sub".into()),
        };
        assert_eq!(failed.content(), "tool not found: sub");
        assert_eq!(failed.tool_call_id(), "2");
    }

    #[test]
    fn spec_from_mcp_tool() {
        let spec = ToolSpec::from(mcp::Tool::new(
            "add",
            "Add two integers.",
            mcp::schema(json!({"type": "object"})),
        ));
        assert_eq!(spec.name, "add");
        assert_eq!(spec.description, "Add two integers.");
        assert_eq!(spec.schema, json!({"type": "object"}));
    }
}
