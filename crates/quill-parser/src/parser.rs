//! The two-pass structural parser.

use quill_common::Span;
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use quill_lexer::{Token, TokenValue, tokenize};
use quill_syntax::{CallNode, ExprItem, ExprNode, Literal, Segment};

/// Parse a line as an expression (implicit `(` wrap).
pub fn parse_expression(line: &str, atoms: &[&str]) -> Result<ExprNode, Diagnostic> {
    let tokens = tokenize(line, atoms)?;
    let top = first_pass(tokens, line, TokenValue::LParen, Strictness::Strict)?;
    Ok(classify_expr(&top, line))
}

/// Parse a line as a function call (implicit `[` wrap).
///
/// The first token supplies the call name; everything after it up to the
/// end of the line is the verbatim, lazily-parsed argument text.
pub fn parse_call(line: &str, atoms: &[&str]) -> Result<CallNode, Diagnostic> {
    let tokens = tokenize(line, atoms)?;
    let top = first_pass(tokens, line, TokenValue::LBracket, Strictness::Strict)?;
    Ok(classify_call(&top, line))
}

/// Split a line into literal text and top-level `(…)` expression spans.
///
/// This mode is lenient about parens used as ordinary punctuation: a
/// stray `)` at the outermost level stays literal text, and a `(` still
/// open at end-of-input degrades back to literal content instead of
/// failing the parse. Bracket and brace mismatches remain errors.
pub fn parse_interpolation(line: &str, atoms: &[&str]) -> Result<Vec<Segment>, Diagnostic> {
    let tokens = tokenize(line, atoms)?;
    let top = first_pass(tokens, line, TokenValue::LParen, Strictness::Lenient)?;

    let mut segments = Vec::new();
    let mut last_end = 0usize;
    for child in &top.children {
        if let Node::Group(group) = child {
            if group.opener.value != TokenValue::LParen {
                continue;
            }
            let open_start = group.opener.span.start as usize;
            if last_end < open_start {
                segments.push(Segment::Text(line[last_end..open_start].to_string()));
            }
            segments.push(Segment::Expr(classify_expr(group, line)));
            last_end = group.closer_span.end as usize;
        }
    }
    if last_end < line.len() {
        segments.push(Segment::Text(line[last_end..].to_string()));
    }
    Ok(segments)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strictness {
    Strict,
    /// Interpolation mode: tolerate unpaired `(`/`)` at the outer level.
    Lenient,
}

/// Pass-1 output: a bracketed group with its opener token and the span
/// of its closer (synthetic for the implicit outer wrap).
struct Group {
    opener: Token,
    children: Vec<Node>,
    closer_span: Span,
}

enum Node {
    Leaf(Token),
    Group(Group),
}

/// Pass 1: fold the token stream into a nesting tree.
///
/// The stream is logically wrapped in an implicit outermost bracket pair
/// whose opener/closer are synthetic and never reported in user errors.
fn first_pass(
    tokens: Vec<Token>,
    line: &str,
    wrap: TokenValue,
    strictness: Strictness,
) -> Result<Group, Diagnostic> {
    struct Open {
        opener: Token,
        children: Vec<Node>,
    }

    let mut stack: Vec<Open> = Vec::new();
    let mut current = Open {
        opener: Token::new(wrap, Span::point(0)),
        children: Vec::new(),
    };

    for token in tokens {
        match token.value {
            TokenValue::LParen | TokenValue::LBracket => {
                stack.push(current);
                current = Open {
                    opener: token,
                    children: Vec::new(),
                };
            }
            TokenValue::RParen | TokenValue::RBracket => {
                if stack.is_empty() {
                    // Only the implicit wrap is open: this closer closes
                    // nothing the user wrote.
                    if strictness == Strictness::Lenient && token.value == TokenValue::RParen {
                        current.children.push(Node::Leaf(token));
                        continue;
                    }
                    return Err(Diagnostic::error(
                        DiagnosticKind::Parser,
                        token.span,
                        format!("unopened '{}'", closer_char(&token.value)),
                    )
                    .with_code(ErrorCode::UnopenedParens)
                    .with_label(Label::new(token.span, "nothing to close here")));
                }
                if !closes(&current.opener.value, &token.value) {
                    return Err(Diagnostic::error(
                        DiagnosticKind::Parser,
                        token.span,
                        format!(
                            "mismatched parens: {} <-> {}",
                            opener_char(&current.opener.value),
                            closer_char(&token.value)
                        ),
                    )
                    .with_code(ErrorCode::MismatchedParens)
                    .with_label(Label::new(current.opener.span, "opened here"))
                    .with_label(Label::new(token.span, "closed here")));
                }
                let group = Group {
                    opener: current.opener,
                    children: current.children,
                    closer_span: token.span,
                };
                current = stack.pop().expect("checked non-empty");
                current.children.push(Node::Group(group));
            }
            _ => current.children.push(Node::Leaf(token)),
        }
    }

    if !stack.is_empty() {
        if strictness == Strictness::Lenient {
            // Degrade unclosed parens back to literal content, innermost
            // first; anything other than a paren stays an error.
            while let Some(mut parent) = stack.pop() {
                if current.opener.value != TokenValue::LParen {
                    return Err(never_closed(std::iter::once(&current.opener)));
                }
                parent.children.push(Node::Leaf(current.opener));
                parent.children.append(&mut current.children);
                current = parent;
            }
        } else {
            // The stack's first entry is the implicit wrap; its synthetic
            // opener is never reported.
            let openers = stack
                .iter()
                .skip(1)
                .map(|open| &open.opener)
                .chain(std::iter::once(&current.opener));
            return Err(never_closed(openers));
        }
    }

    Ok(Group {
        opener: current.opener,
        children: current.children,
        closer_span: Span::point(line.len()),
    })
}

fn never_closed<'t>(openers: impl Iterator<Item = &'t Token>) -> Diagnostic {
    let mut spans: Vec<Span> = openers.map(|t| t.span).collect();
    spans.sort_by_key(|s| s.start);
    let mut diagnostic = Diagnostic::error(
        DiagnosticKind::Parser,
        spans.first().copied().unwrap_or(Span::DUMMY),
        "these parens were never closed",
    )
    .with_code(ErrorCode::UnclosedParens);
    for span in spans {
        diagnostic = diagnostic.with_label(Label::new(span, "never closed"));
    }
    diagnostic
}

fn closes(opener: &TokenValue, closer: &TokenValue) -> bool {
    matches!(
        (opener, closer),
        (TokenValue::LParen, TokenValue::RParen) | (TokenValue::LBracket, TokenValue::RBracket)
    )
}

fn opener_char(value: &TokenValue) -> char {
    match value {
        TokenValue::LBracket => '[',
        _ => '(',
    }
}

fn closer_char(value: &TokenValue) -> char {
    match value {
        TokenValue::RBracket => ']',
        _ => ')',
    }
}

/// Pass 2: classify a `(` group (or the implicit wrap) as an expression.
fn classify_expr(group: &Group, line: &str) -> ExprNode {
    let items = group
        .children
        .iter()
        .map(|child| match child {
            Node::Leaf(token) => ExprItem::Literal(classify_token(token)),
            Node::Group(inner) => classify_group(inner, line),
        })
        .collect();
    ExprNode {
        items,
        span: group.opener.span.merge(group.closer_span),
    }
}

fn classify_group(group: &Group, line: &str) -> ExprItem {
    match group.opener.value {
        TokenValue::LBracket => ExprItem::Call(classify_call(group, line)),
        _ => ExprItem::Group(classify_expr(group, line)),
    }
}

/// Pass 2: classify a `[` group (or the implicit wrap) as a call.
fn classify_call(group: &Group, line: &str) -> CallNode {
    let span = group.opener.span.merge(group.closer_span);
    let Some(first) = group.children.first() else {
        return CallNode {
            name: String::new(),
            arg: String::new(),
            span,
        };
    };
    let name_span = node_span(first);
    let name = line[name_span.range()].to_string();
    let arg = if group.children.len() > 1 {
        line[name_span.end as usize..group.closer_span.start as usize].to_string()
    } else {
        String::new()
    };
    CallNode { name, arg, span }
}

fn node_span(node: &Node) -> Span {
    match node {
        Node::Leaf(token) => token.span,
        Node::Group(group) => group.opener.span.merge(group.closer_span),
    }
}

fn classify_token(token: &Token) -> Literal {
    match &token.value {
        TokenValue::Int(n) => Literal::Int(*n),
        TokenValue::Float(f) => Literal::Float(*f),
        TokenValue::Brace(s) | TokenValue::Str(s) | TokenValue::Atom(s) | TokenValue::Word(s) => {
            Literal::Text(s.clone())
        }
        // Degraded parens from lenient mode; never classified in
        // practice because interpolation slices around them.
        TokenValue::LParen => Literal::Text("(".to_string()),
        TokenValue::RParen => Literal::Text(")".to_string()),
        TokenValue::LBracket => Literal::Text("[".to_string()),
        TokenValue::RBracket => Literal::Text("]".to_string()),
    }
}
