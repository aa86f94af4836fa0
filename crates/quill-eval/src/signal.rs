//! Control signals.
//!
//! Signals are expected, structured non-local exits, not bugs. They
//! thread through every evaluation call as the error arm of a `Result`
//! and are checked explicitly at loop and function boundaries; nothing
//! here relies on unwinding.

use crate::error::EvalError;
use crate::value::Value;

/// Why an evaluation call did not produce a value normally.
#[derive(Debug)]
pub enum Interrupt {
    /// Skip the rest of the current loop iteration (`next`).
    Next,
    /// Leave the nearest enclosing loop (`done`).
    Done,
    /// Unwind to the nearest function invocation boundary (`return`).
    Return(Value),
    /// Fatal, caught nowhere internally (`abort`).
    Abort(String),
    /// An actual error, as opposed to a signal.
    Error(EvalError),
}

pub type EvalResult<T> = Result<T, Interrupt>;

impl From<EvalError> for Interrupt {
    fn from(error: EvalError) -> Self {
        Interrupt::Error(error)
    }
}
