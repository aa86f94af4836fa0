//! Parsed-tree definitions for Quill.
//!
//! An instruction line parses into one of three shapes depending on the
//! implicit outer wrap: an expression tree, a function-call node, or an
//! interpolation-span sequence.

mod ast;

pub use ast::{CallNode, ExprItem, ExprNode, Literal, Segment};
