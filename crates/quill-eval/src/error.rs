//! Evaluation errors.

use quill_diagnostic::Diagnostic;
use thiserror::Error;

/// An evaluation failure. Structural errors carry the instruction line
/// they were raised on so callers can render the diagnostic against it.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("syntax error: {}", .diagnostic.message)]
    Syntax {
        line: String,
        diagnostic: Diagnostic,
    },

    #[error("unbound variable ${0}")]
    UnboundVariable(String),

    #[error("no function '{0}'")]
    UnknownFunction(String),

    #[error("'{0}' is not a function")]
    NotAFunction(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("postfix operator not allowed at beginning")]
    PostfixAtStart,

    #[error("prefix operator not allowed at end")]
    PrefixAtEnd,

    #[error("expected a single value, found {0}")]
    SingleValueExpected(usize),

    #[error("no block {0}")]
    UnknownBlock(String),

    #[error("no key '{0}'")]
    KeyNotFound(String),

    #[error("index {0} out of range")]
    IndexOutOfRange(i64),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize),

    #[error("'{0}' outside of a loop")]
    SignalOutsideLoop(&'static str),

    #[error("'return' outside of a function")]
    ReturnOutsideFunction,

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("input error: {0}")]
    Input(String),
}
