//! CLI command implementations.
//! CLI 命令实现。

pub mod eval;
pub mod repl;
pub mod run;

use quill_diagnostic::emit;
use quill_eval::EvalError;

/// Report an evaluation failure, rendering structural errors against
/// the instruction line they were raised on.
/// 报告求值失败，结构性错误会对照出错的指令行渲染。
pub fn report(origin: &str, error: &EvalError) {
    match error {
        EvalError::Syntax { line, diagnostic } => emit(line, origin, diagnostic),
        other => eprintln!("error: {other}"),
    }
}
