//! Two-argument integer tools.

use mcp::{JsonObject, Tool, ToolFailure, ToolHandler, server::parse_arguments};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Operands are bounded to `i64` so oversized input is rejected before the call.
fn integer_pair_schema(first: &str, second: &str) -> JsonObject {
    let operand = json!({"type": "integer", "minimum": i64::MIN, "maximum": i64::MAX});
    mcp::schema(json!({
        "type": "object",
        "properties": {
            first: operand,
            second: operand
        },
        "required": [first, second]
    }))
}

/// `add(a, b) -> a + b`
#[derive(Debug, Default)]
pub struct Add;

#[derive(Deserialize)]
struct AddArgs {
    a: i64,
    b: i64,
}

impl ToolHandler for Add {
    fn descriptor(&self) -> Tool {
        Tool::new("add", "Add two integers.", integer_pair_schema("a", "b"))
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let AddArgs { a, b } = parse_arguments(arguments)?;
        a.checked_add(b)
            .map(|sum| sum.to_string())
            .ok_or_else(|| ToolFailure::new(format!("{a} + {b} overflows")))
    }
}

/// `mul(c, d) -> c * d`
#[derive(Debug, Default)]
pub struct Mul;

#[derive(Deserialize)]
struct MulArgs {
    c: i64,
    d: i64,
}

impl ToolHandler for Mul {
    fn descriptor(&self) -> Tool {
        Tool::new("mul", "Multiply two integers.", integer_pair_schema("c", "d"))
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let MulArgs { c, d } = parse_arguments(arguments)?;
        c.checked_mul(d)
            .map(|product| product.to_string())
            .ok_or_else(|| ToolFailure::new(format!("{c} * {d} overflows")))
    }
}
