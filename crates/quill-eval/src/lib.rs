//! Interpreter/evaluator for Quill.
//!
//! This crate implements a tree-walking interpreter over program forms:
//! `Value` trees whose text leaves are instruction lines, whose lists
//! are statement sequences, and whose mappings are control blocks.

mod builtin;
mod engine;
mod error;
mod io;
mod ops;
mod scope;
mod signal;
mod template;
mod value;

pub use engine::Engine;
pub use error::EvalError;
pub use io::{EngineIo, StdIo};
pub use ops::{OpEntry, OPERATORS};
pub use scope::{Frame, ScopeEntry, ScopeStack};
pub use signal::{EvalResult, Interrupt};
pub use value::{Function, HostObject, Value};
