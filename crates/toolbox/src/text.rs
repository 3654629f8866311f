//! String tools.

use mcp::{Tool, ToolFailure, ToolHandler, server::parse_arguments};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// `cat(familyname, surname) -> "{surname} {familyname}"`
#[derive(Debug, Default)]
pub struct Cat;

#[derive(Deserialize)]
struct CatArgs {
    familyname: String,
    surname: String,
}

impl ToolHandler for Cat {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "cat",
            "Join a surname and a family name into a full name.",
            mcp::schema(json!({
                "type": "object",
                "properties": {
                    "familyname": {"type": "string"},
                    "surname": {"type": "string"}
                },
                "required": ["familyname", "surname"]
            })),
        )
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let CatArgs {
            familyname,
            surname,
        } = parse_arguments(arguments)?;
        Ok(format!("{surname} {familyname}"))
    }
}

/// The workshop's string transform: `barrow(a, b) -> a + MARKER + b`.
#[derive(Debug, Default)]
pub struct Barrow;

const BARROW_MARKER: &str = "sit2024commonworkshop";

#[derive(Deserialize)]
struct BarrowArgs {
    a: String,
    b: String,
}

impl ToolHandler for Barrow {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "barrow",
            "Compute the barrow transform of two strings. No other calculation is defined.",
            mcp::schema(json!({
                "type": "object",
                "properties": {
                    "a": {"type": "string"},
                    "b": {"type": "string"}
                },
                "required": ["a", "b"]
            })),
        )
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let BarrowArgs { a, b } = parse_arguments(arguments)?;
        Ok(format!("{a}{BARROW_MARKER}{b}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn cat_puts_surname_first() {
        let out = Cat
            .call(&args(json!({"familyname": "Li", "surname": "Xinxiao"})))
            .unwrap();
        assert_eq!(out, "Xinxiao Li");
    }

    #[test]
    fn barrow_wraps_marker() {
        let out = Barrow.call(&args(json!({"a": "x", "b": "y"}))).unwrap();
        assert_eq!(out, "xsit2024commonworkshopy");
    }

    #[test]
    fn missing_argument_fails_without_schema_check() {
        let err = Cat.call(&args(json!({"surname": "Xinxiao"}))).unwrap_err();
        assert!(err.to_string().contains("familyname"));
    }
}
