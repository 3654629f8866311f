//! Turning a model response into the next action.
//!
//! Two strategies exist. [`DecisionMode::Structured`] relies on the
//! provider's function calling and reads tool calls from the response
//! message. [`DecisionMode::Text`] is the degraded path for models without
//! function calling: the catalog is flattened into the prompt and the model
//! must reply with a small JSON object.

use crate::model::{Message, ToolCall, ToolSpec};
use serde::Deserialize;
use serde_json::{Map, Value};

/// How the model is asked to pick a tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    #[default]
    Structured,
    Text,
}

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer the user directly with this text.
    Answer(String),
    /// Invoke one tool, then ask the model again.
    Invoke(ToolCall),
    /// The output could not be mapped to an action. Carries the raw text.
    Unresolved(String),
}

/// Read the decision from a function-calling response.
///
/// Only the first tool call is honored.
pub fn resolve_structured(message: &Message) -> Decision {
    let mut calls = message.tool_calls();
    if calls.is_empty() {
        return Decision::Answer(message.text());
    }
    if calls.len() > 1 {
        tracing::warn!(
            count = calls.len(),
            "model requested several tools, invoking the first"
        );
    }

    let call = calls.swap_remove(0);
    match call.input {
        Value::Object(_) => Decision::Invoke(call),
        Value::Null => Decision::Invoke(ToolCall {
            input: Value::Object(Map::new()),
            ..call
        }),
        other => Decision::Unresolved(format!("{}({other})", call.name)),
    }
}

/// Prompt for the text strategy.
pub fn text_prompt(query: &str, tools: &[ToolSpec]) -> String {
    let mut prompt = format!("User query: {query}\nAvailable tools:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    prompt.push_str(
        "You are a tool-calling assistant.\n\
         Given the user query and the available tools, decide whether one tool is needed.\n\
         If it is, reply with only a JSON object of the form \
         {\"tool\": string, \"arguments\": object}.\n\
         Otherwise reply with only a JSON object of the form {\"answer\": string}.",
    );
    prompt
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TextDecision {
    tool: Option<String>,
    arguments: Option<Value>,
    answer: Option<String>,
}

/// Parse the model's reply under the text strategy.
///
/// Anything other than exactly one of the two documented shapes is
/// [`Decision::Unresolved`]. Never fails.
pub fn parse_text_decision(raw: &str) -> Decision {
    let unresolved = || Decision::Unresolved(raw.to_string());

    let cleaned = strip_code_fence(raw);
    let Ok(decision) = serde_json::from_str::<TextDecision>(cleaned) else {
        return unresolved();
    };

    match decision {
        TextDecision {
            tool: Some(name),
            arguments,
            answer: None,
        } if !name.trim().is_empty() => {
            let input = match arguments {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(args @ Value::Object(_)) => args,
                Some(_) => return unresolved(),
            };
            Decision::Invoke(ToolCall {
                id: "text-decision".to_string(),
                name,
                input,
            })
        }
        TextDecision {
            tool: None,
            arguments: None,
            answer: Some(answer),
        } => Decision::Answer(answer),
        _ => unresolved(),
    }
}

/// Second-round prompt for the text strategy.
pub fn final_prompt(query: &str, tool: &str, result: &str) -> String {
    format!(
        "User asked: {query}\nTool '{tool}' was used and returned: {result}\n\
         Please generate a final exact response."
    )
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The "json" info string may sit on the fence line or run into the body.
    let body = rest.strip_prefix("json").unwrap_or(rest).trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
