//! Sample tools served by `relay serve`.
//!
//! - `add`, `mul`: two-argument integer arithmetic
//! - `cat`, `barrow`: string composition
//! - `get_knowledge_base`: formatted dump of a JSON Q&A file

mod arithmetic;
mod knowledge;
mod text;

use std::path::Path;

use mcp::ToolRegistry;

pub use arithmetic::{Add, Mul};
pub use knowledge::{KnowledgeBase, format_knowledge_base};
pub use text::{Barrow, Cat};

/// Knowledge base shipped with the crate.
pub const SAMPLE_KNOWLEDGE_BASE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/kb.json");

/// Arithmetic and concatenation tools.
pub fn calculator() -> mcp::Result<ToolRegistry> {
    ToolRegistry::new().with(Add)?.with(Mul)?.with(Cat)
}

/// Every tool, with the knowledge base read from `kb_path`.
pub fn registry(kb_path: impl AsRef<Path>) -> mcp::Result<ToolRegistry> {
    calculator()?
        .with(Barrow)?
        .with(KnowledgeBase::new(kb_path.as_ref()))
}
