//! Parsed-tree node types.

use quill_common::Span;

/// A literal element of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    /// Free text, a quoted string, an opaque brace block, or an operator
    /// atom; the reducer tells operators apart by name equality.
    Text(String),
}

/// An expression: an ordered sequence of elements subject to operator
/// reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub items: Vec<ExprItem>,
    pub span: Span,
}

/// One element of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprItem {
    Literal(Literal),
    /// A `[name …]` function call, invoked during element resolution.
    Call(CallNode),
    /// A nested `(…)` group, reduced recursively and spliced.
    Group(ExprNode),
}

/// A parsed `[name argument]` form.
///
/// The argument is the verbatim source substring and is *not* parsed
/// here: builtins parse their own argument text by convention, and the
/// reducer parses it as an expression only for user-defined functions.
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub name: String,
    pub arg: String,
    pub span: Span,
}

/// One span of an interpolated line: literal text, or a parenthesized
/// expression to evaluate and splice in.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Expr(ExprNode),
}
