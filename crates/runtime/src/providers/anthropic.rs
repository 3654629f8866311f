//! Anthropic Messages API backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolChoice,
    ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ApiToolChoice>,
}

#[derive(Debug, Serialize)]
struct ApiToolChoice {
    #[serde(rename = "type")]
    choice_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl AnthropicBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 1024,
            system: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Point at a different host, e.g. a proxy. `/v1/messages` is appended.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/messages", self.base_url.trim_end_matches('/')),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
        }
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
}

impl AnthropicBackend {
    pub fn builder(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User | Role::System => "user",
            Role::Assistant => "assistant",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let role = Self::role_to_api(msg.role);

        if let [Part::Text(text)] = msg.parts.as_slice() {
            return ApiMessage {
                role,
                content: ApiContent::Text(text.clone()),
            };
        }

        let blocks = msg
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => ApiContentBlock::Text { text: text.clone() },
                Part::ToolCall(call) => ApiContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                },
                Part::ToolResult(result) => ApiContentBlock::ToolResult {
                    tool_use_id: result.tool_call_id().to_string(),
                    content: result.content(),
                    is_error: result.is_error(),
                },
            })
            .collect();

        ApiMessage {
            role,
            content: ApiContent::Blocks(blocks),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: spec.schema.clone(),
        }
    }

    fn response_to_message(blocks: Vec<ApiResponseBlock>) -> Message {
        let parts = blocks
            .into_iter()
            .filter_map(|block| match block {
                ApiResponseBlock::Text { text } => Some(Part::Text(text)),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    Some(Part::ToolCall(ToolCall { id, name, input }))
                }
                ApiResponseBlock::Unknown => None,
            })
            .collect();

        Message {
            role: Role::Assistant,
            parts,
        }
    }

    fn build_request(&self, request: &ModelRequest<'_>) -> ApiRequest {
        let tools: Vec<ApiTool> = request.tools.iter().map(Self::tool_to_api).collect();
        let tool_choice = (!tools.is_empty()).then(|| ApiToolChoice {
            choice_type: match request.tool_choice {
                ToolChoice::Auto => "auto",
                ToolChoice::None => "none",
            },
        });

        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(Self::message_to_api)
                .collect(),
            system: self.system.clone(),
            tools,
            tool_choice,
        }
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl Backend for AnthropicBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(&request);
        tracing::debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            "anthropic request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let message = Self::response_to_message(api_response.content);
        let usage = Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        };

        Ok(ModelResponse { message, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use crate::tools::ToolError;
    use mockito::Matcher;
    use serde_json::json;

    fn add_spec() -> ToolSpec {
        ToolSpec {
            name: "add".into(),
            description: "Add two numbers".into(),
            schema: json!({"type": "object", "properties": {"a": {"type": "integer"}}}),
        }
    }

    #[test]
    fn tool_results_become_blocks() {
        let msg = Message::tool_results(vec![ToolResult::Failure {
            tool_call_id: "toolu_1".into(),
            error: ToolError::NotFound("sub".into()),
        }]);
        let api = serde_json::to_value(AnthropicBackend::message_to_api(&msg)).unwrap();
        assert_eq!(
            api,
            json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_1",
                    "content": "tool not found: sub",
                    "is_error": true
                }]
            })
        );
    }

    #[test]
    fn tool_choice_only_with_tools() {
        let backend = AnthropicBackend::builder("key", "claude").build();
        let messages = [Message::user("hi")];

        let request = backend.build_request(&ModelRequest {
            messages: &messages,
            tools: &[],
            tool_choice: ToolChoice::None,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());

        let tools = [add_spec()];
        let request = backend.build_request(&ModelRequest {
            messages: &messages,
            tools: &tools,
            tool_choice: ToolChoice::None,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!({"type": "none"}));
        assert_eq!(value["tools"][0]["input_schema"]["type"], "object");
    }

    #[tokio::test]
    async fn parses_tool_use_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-test",
                "system": "be brief",
                "tool_choice": {"type": "auto"},
                "messages": [{"role": "user", "content": "what is 2+3?"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": [
                        {"type": "text", "text": "Let me add."},
                        {
                            "type": "tool_use",
                            "id": "toolu_1",
                            "name": "add",
                            "input": {"a": 2, "b": 3}
                        }
                    ],
                    "usage": {"input_tokens": 12, "output_tokens": 7}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = AnthropicBackend::builder("test-key", "claude-test")
            .system("be brief")
            .base_url(server.url())
            .build();
        let messages = [Message::user("what is 2+3?")];
        let tools = [add_spec()];
        let response = backend
            .call(ModelRequest {
                messages: &messages,
                tools: &tools,
                tool_choice: ToolChoice::Auto,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.message.text(), "Let me add.");
        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input, json!({"a": 2, "b": 3}));
        assert_eq!(response.usage.input_tokens, 12);
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid x-api-key"}}"#)
            .create_async()
            .await;

        let backend = AnthropicBackend::builder("bad", "claude-test")
            .base_url(server.url())
            .build();
        let messages = [Message::user("hi")];
        let err = backend
            .call(ModelRequest {
                messages: &messages,
                tools: &[],
                tool_choice: ToolChoice::Auto,
            })
            .await
            .unwrap_err();

        match err {
            ModelError::Api(text) => assert!(text.contains("401")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
