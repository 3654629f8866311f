//! OpenAI Chat Completions backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolChoice,
    ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl OpenAiBackendBuilder {
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

    /// Any Chat Completions compatible endpoint. `/chat/completions` is appended.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
        }
    }
}

/// OpenAI API backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One model message can fan out into several API messages: tool results
    /// each travel as their own `tool` message.
    fn message_to_api(msg: &Message, out: &mut Vec<ApiMessage>) {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let text = msg.text();
        let tool_calls: Vec<ApiToolCall> = msg
            .tool_calls()
            .into_iter()
            .map(|call| ApiToolCall {
                id: call.id,
                call_type: function_type(),
                function: ApiFunctionCall {
                    name: call.name,
                    arguments: call.input.to_string(),
                },
            })
            .collect();

        if !text.is_empty() || !tool_calls.is_empty() {
            out.push(ApiMessage {
                role,
                content: (!text.is_empty()).then_some(text),
                tool_calls,
                tool_call_id: None,
            });
        }

        for part in &msg.parts {
            if let Part::ToolResult(result) = part {
                out.push(ApiMessage {
                    role: "tool",
                    content: Some(result.content()),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(result.tool_call_id().to_string()),
                });
            }
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.schema.clone(),
            },
        }
    }

    fn response_to_message(message: ApiResponseMessage) -> Message {
        let mut parts = Vec::new();
        if let Some(text) = message.content.filter(|t| !t.is_empty()) {
            parts.push(Part::Text(text));
        }
        for call in message.tool_calls {
            // Unparseable arguments are passed on as a string; the decision
            // step rejects non-object input.
            let input = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            parts.push(Part::ToolCall(ToolCall {
                id: call.id,
                name: call.function.name,
                input,
            }));
        }

        Message {
            role: Role::Assistant,
            parts,
        }
    }

    fn build_request(&self, request: &ModelRequest<'_>) -> ApiRequest {
        let mut messages = Vec::new();
        if let Some(system) = &self.system {
            messages.push(ApiMessage::text("system", system.clone()));
        }
        for msg in request.messages {
            Self::message_to_api(msg, &mut messages);
        }

        let tools: Vec<ApiTool> = request.tools.iter().map(Self::tool_to_api).collect();
        let tool_choice = (!tools.is_empty()).then_some(match request.tool_choice {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        });

        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages,
            tools,
            tool_choice,
        }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({})", self.model)
    }
}

impl Backend for OpenAiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(&request);
        tracing::debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            "openai request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
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

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::Empty)?;
        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use mockito::Matcher;
    use serde_json::json;

    fn backend(url: &str) -> OpenAiBackend {
        OpenAiBackend::builder("sk-test", "gpt-test")
            .base_url(url)
            .build()
    }

    #[test]
    fn conversation_maps_to_chat_messages() {
        let backend = OpenAiBackend::builder("sk-test", "gpt-test")
            .system("be brief")
            .build();
        let messages = [
            Message::user("what is 2+3?"),
            Message {
                role: Role::Assistant,
                parts: vec![Part::ToolCall(ToolCall {
                    id: "call_1".into(),
                    name: "add".into(),
                    input: json!({"a": 2, "b": 3}),
                })],
            },
            Message::tool_results(vec![ToolResult::Success {
                tool_call_id: "call_1".into(),
                output: Value::String("5".into()),
            }]),
        ];
        let request = backend.build_request(&ModelRequest {
            messages: &messages,
            tools: &[],
            tool_choice: ToolChoice::None,
        });
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["messages"],
            json!([
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "what is 2+3?"},
                {"role": "assistant", "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}
                }]},
                {"role": "tool", "content": "5", "tool_call_id": "call_1"}
            ])
        );
        assert!(value.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn parses_tool_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-test",
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "add"}}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {"name": "add", "arguments": "{\"a\": 2, \"b\": 3}"}
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let messages = [Message::user("what is 2+3?")];
        let tools = [ToolSpec {
            name: "add".into(),
            description: "Add two numbers".into(),
            schema: json!({"type": "object"}),
        }];
        let response = backend(&server.url())
            .call(ModelRequest {
                messages: &messages,
                tools: &tools,
                tool_choice: ToolChoice::Auto,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].input, json!({"a": 2, "b": 3}));
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn unparseable_arguments_kept_as_string() {
        let message = OpenAiBackend::response_to_message(ApiResponseMessage {
            content: Some("".into()),
            tool_calls: vec![ApiToolCall {
                id: "call_1".into(),
                call_type: function_type(),
                function: ApiFunctionCall {
                    name: "add".into(),
                    arguments: "{a: 2".into(),
                },
            }],
        });
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.tool_calls()[0].input, Value::String("{a: 2".into()));
    }

    #[tokio::test]
    async fn no_choices_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let messages = [Message::user("hi")];
        let err = backend(&server.url())
            .call(ModelRequest {
                messages: &messages,
                tools: &[],
                tool_choice: ToolChoice::Auto,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Empty));
    }
}
