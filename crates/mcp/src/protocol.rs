//! Protocol conventions layered on the rmcp model types.

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, JsonObject};
use serde_json::Value;

/// Protocol revision the tool host advertises.
pub use rmcp::model::ProtocolVersion;

/// `data.reason` for a call naming a tool the host does not expose.
pub const REASON_TOOL_NOT_FOUND: &str = "tool_not_found";
/// `data.reason` for arguments rejected by the tool's input schema.
pub const REASON_INVALID_ARGUMENTS: &str = "invalid_arguments";

/// Machine-readable reason attached to a host rejection, if any.
pub fn reason(error: &ErrorData) -> Option<&str> {
    error.data.as_ref()?.get("reason")?.as_str()
}

/// An `invalid_params` error tagged with `data.reason`.
pub fn rejection(message: String, reason: &str) -> ErrorData {
    ErrorData::invalid_params(message, Some(serde_json::json!({ "reason": reason })))
}

/// The first text part, which is all the orchestrator consumes.
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    result
        .content
        .iter()
        .find_map(|content| content.raw.as_text())
        .map(|text| text.text.as_str())
}

/// Every text part, newline separated.
pub fn joined_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| content.raw.as_text())
        .map(|text| text.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Input schema from a `json!` literal. Anything but an object yields `{}`.
pub fn schema(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}
