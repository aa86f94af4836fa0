//! Structural parser for Quill instruction lines.
//!
//! Two passes over the tokenizer's output: pass one nests bracketed
//! groups (always inside an implicit outermost wrap), pass two
//! classifies each group as an opaque literal, a function-call node, or
//! an expression node. A third, lenient mode splits a line into literal
//! text and parenthesized expressions for string interpolation.

mod parser;
mod split;

pub use parser::{parse_call, parse_expression, parse_interpolation};
pub use split::split_top_level;
