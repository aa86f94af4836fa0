//! Lexical analysis for Quill instruction lines.
//! Quill 指令行的词法分析。

mod lexer;
mod token;

pub use lexer::tokenize;
pub use token::{Token, TokenValue};
