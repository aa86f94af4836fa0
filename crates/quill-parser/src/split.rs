//! Top-level delimiter splitting.

use quill_common::Span;
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// Split a line at every occurrence of `delim` outside any paren,
/// bracket, brace, or quote nesting. Delimiters are dropped; empty
/// pieces are kept (callers skip them as needed).
///
/// Used for `;` statement sequences and `,`-separated list items.
pub fn split_top_level(line: &str, delim: char) -> Result<Vec<String>, Diagnostic> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (pos, c) in line.char_indices() {
        match c {
            '\'' | '"' => {
                // Quotes toggle: an opener whose closer is itself.
                if stack.last().is_some_and(|(open, _)| *open == c) {
                    stack.pop();
                } else {
                    stack.push((c, pos));
                }
            }
            '(' | '[' | '{' => stack.push((c, pos)),
            ')' | ']' | '}' => match stack.pop() {
                None => {
                    return Err(Diagnostic::error(
                        DiagnosticKind::Parser,
                        Span::from_usize(pos, pos + 1),
                        format!("unopened '{c}'"),
                    )
                    .with_code(ErrorCode::UnopenedParens)
                    .with_label(Label::new(
                        Span::from_usize(pos, pos + 1),
                        "nothing to close here",
                    )));
                }
                Some((open, open_pos)) if closer_of(open) != c => {
                    return Err(Diagnostic::error(
                        DiagnosticKind::Parser,
                        Span::from_usize(pos, pos + 1),
                        format!("closing paren '{c}' does not match opening paren '{open}'"),
                    )
                    .with_code(ErrorCode::MismatchedParens)
                    .with_label(Label::new(
                        Span::from_usize(open_pos, open_pos + 1),
                        "opened here",
                    ))
                    .with_label(Label::new(Span::from_usize(pos, pos + 1), "closed here")));
                }
                Some(_) => {}
            },
            _ => {}
        }

        if stack.is_empty() && c == delim {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    if let Some(&(open, open_pos)) = stack.last() {
        return Err(Diagnostic::error(
            DiagnosticKind::Parser,
            Span::from_usize(open_pos, open_pos + 1),
            format!("unmatched '{open}'"),
        )
        .with_code(ErrorCode::UnclosedParens)
        .with_label(Label::new(
            Span::from_usize(open_pos, open_pos + 1),
            "never closed",
        )));
    }

    parts.push(current);
    Ok(parts)
}

fn closer_of(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        other => other,
    }
}
