//! Read-only knowledge base lookup.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use mcp::{Tool, ToolFailure, ToolHandler};
use serde_json::{Map, Value, json};

/// `get_knowledge_base() -> formatted Q&A text`
///
/// The file is read on every call; it is never cached.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    path: PathBuf,
}

impl KnowledgeBase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ToolHandler for KnowledgeBase {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "get_knowledge_base",
            "Retrieve the entire knowledge base as a formatted string of Q&A pairs.",
            mcp::schema(json!({"type": "object", "properties": {}})),
        )
    }

    fn call(&self, _arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolFailure::new(format!(
                    "knowledge base file not found: {}",
                    self.path.display()
                ))
            } else {
                ToolFailure::new(format!("failed to read knowledge base: {e}"))
            }
        })?;

        let data: Value = serde_json::from_str(&raw)
            .map_err(|e| ToolFailure::new(format!("knowledge base is not valid JSON: {e}")))?;

        tracing::debug!(path = %self.path.display(), "knowledge base loaded");
        Ok(format_knowledge_base(&data))
    }
}

/// Render a knowledge base document as numbered Q/A pairs.
pub fn format_knowledge_base(data: &Value) -> String {
    let mut text = String::from("Here is the retrieved knowledge base:\n\n");

    let Value::Array(items) = data else {
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        let _ = write!(text, "Knowledge base content: {pretty}\n\n");
        return text;
    };

    for (i, item) in items.iter().enumerate() {
        let n = i + 1;
        let (question, answer) = match item {
            Value::Object(entry) => (
                field(entry, "question").unwrap_or_else(|| "Unknown question".to_string()),
                field(entry, "answer").unwrap_or_else(|| "Unknown answer".to_string()),
            ),
            other => (format!("Item {n}"), display(other)),
        };
        let _ = write!(text, "Q{n}: {question}\nA{n}: {answer}\n\n");
    }
    text
}

fn field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).map(display)
}

/// Strings render bare, everything else as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn formats_question_answer_pairs() {
        let data = json!([
            {"question": "Leave days?", "answer": "20"},
            {"question": "Carry over?"},
            "free text"
        ]);
        let text = format_knowledge_base(&data);
        assert_eq!(
            text,
            "Here is the retrieved knowledge base:\n\n\
             Q1: Leave days?\nA1: 20\n\n\
             Q2: Carry over?\nA2: Unknown answer\n\n\
             Q3: Item 3\nA3: free text\n\n"
        );
    }

    #[test]
    fn non_list_document_is_dumped() {
        let text = format_knowledge_base(&json!({"policy": "20 days"}));
        assert!(text.contains("Knowledge base content: {\n  \"policy\": \"20 days\"\n}"));
    }

    #[test]
    fn reads_file_on_each_call() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"question": "q", "answer": "a"}}]"#).unwrap();
        let kb = KnowledgeBase::new(file.path());

        let first = kb.call(&Map::new()).unwrap();
        assert!(first.contains("Q1: q\nA1: a"));

        std::fs::write(file.path(), r#"[{"question": "q2", "answer": "a2"}]"#).unwrap();
        let second = kb.call(&Map::new()).unwrap();
        assert!(second.contains("Q1: q2\nA1: a2"));
    }

    #[test]
    fn missing_file_is_a_tool_failure() {
        let kb = KnowledgeBase::new("/nonexistent/relay/kb.json");
        let err = kb.call(&Map::new()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn invalid_json_is_a_tool_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{ nope").unwrap();
        let err = KnowledgeBase::new(file.path()).call(&Map::new()).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
