//! Diagnostic and error reporting for Quill.
//! Quill 的诊断和错误报告。
//!
//! Parse failures point at the offending spans of the one instruction
//! line they occurred in; this crate renders them with ariadne.
//! 解析失败会指向出错指令行中的具体范围；本 crate 使用 ariadne 渲染。

mod codes;
mod diagnostic;

pub use codes::ErrorCode;
pub use diagnostic::{Diagnostic, DiagnosticKind, Label, Severity};

use ariadne::{ColorGenerator, Label as AriadneLabel, Report, ReportKind, Source};

/// Render a diagnostic against the instruction line it was raised on.
/// 将诊断信息对照其出错的指令行渲染到标准错误输出。
pub fn emit(line: &str, origin: &str, diagnostic: &Diagnostic) {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, origin, diagnostic.span.start as usize)
        .with_message(&diagnostic.message);

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    for label in &diagnostic.labels {
        let color = colors.next();
        let ariadne_label = AriadneLabel::new((origin, label.span.range()))
            .with_message(&label.message)
            .with_color(color);
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    }

    report
        .finish()
        .eprint((origin, Source::from(line)))
        .unwrap();
}
