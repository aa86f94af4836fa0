//! The Quill tokenizer.
//! Quill 词法分析器。
//!
//! Unlike a fixed-grammar lexer, the token set is configured per call:
//! the evaluator supplies its operator names as "atoms" and the
//! tokenizer recognizes them as units.
//! 与固定文法的词法分析器不同，token 集合按调用配置：求值器提供其
//! 运算符名称作为 "atom"，词法分析器将它们识别为整体。

use crate::token::{Token, TokenValue};
use quill_common::Span;
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// Tokenize one instruction line against a set of atom strings.
/// 按 atom 字符串集合对一行指令进行词法分析。
///
/// Recognition priority at each position: bracket characters, opaque
/// `{…}` blocks, quoted strings, numbers, atoms (longest first), and
/// finally free text.
/// 每个位置的识别优先级：括号字符、不透明 `{…}` 块、带引号字符串、
/// 数字、atom（最长优先），最后是自由文本。
pub fn tokenize(line: &str, atoms: &[&str]) -> Result<Vec<Token>, Diagnostic> {
    let mut sorted: Vec<&str> = atoms.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));

    let scanner = Scanner {
        line,
        atoms: sorted,
    };
    scanner.run()
}

struct Scanner<'src> {
    line: &'src str,
    /// Atoms sorted longest-first to avoid prefix ambiguity
    /// 按最长优先排序的 atom，避免前缀歧义
    atoms: Vec<&'src str>,
}

impl<'src> Scanner<'src> {
    fn run(&self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < self.line.len() {
            let ch = self.char_at(pos);

            if ch.is_whitespace() {
                pos += ch.len_utf8();
                continue;
            }

            let start = pos;
            match ch {
                '(' => {
                    tokens.push(Token::new(TokenValue::LParen, Span::from_usize(pos, pos + 1)));
                    pos += 1;
                }
                ')' => {
                    tokens.push(Token::new(TokenValue::RParen, Span::from_usize(pos, pos + 1)));
                    pos += 1;
                }
                '[' => {
                    tokens.push(Token::new(
                        TokenValue::LBracket,
                        Span::from_usize(pos, pos + 1),
                    ));
                    pos += 1;
                }
                ']' => {
                    tokens.push(Token::new(
                        TokenValue::RBracket,
                        Span::from_usize(pos, pos + 1),
                    ));
                    pos += 1;
                }
                '{' => {
                    let (payload, end) = self.scan_brace_block(pos)?;
                    tokens.push(Token::new(
                        TokenValue::Brace(payload),
                        Span::from_usize(start, end),
                    ));
                    pos = end;
                }
                '}' => {
                    return Err(Diagnostic::error(
                        DiagnosticKind::Lexer,
                        Span::from_usize(pos, pos + 1),
                        "unopened '}'",
                    )
                    .with_code(ErrorCode::UnopenedBrace)
                    .with_label(Label::new(
                        Span::from_usize(pos, pos + 1),
                        "no matching '{' before this",
                    )));
                }
                _ => {
                    if (ch == '\'' || ch == '"') && self.boundary_before(pos) {
                        if let Some((value, end)) = self.scan_quoted(pos, ch) {
                            tokens.push(Token::new(
                                TokenValue::Str(value),
                                Span::from_usize(start, end),
                            ));
                            pos = end;
                            continue;
                        }
                    }
                    if let Some((value, end)) = self.scan_number(pos) {
                        tokens.push(Token::new(value, Span::from_usize(start, end)));
                        pos = end;
                        continue;
                    }
                    if let Some((atom, end)) = self.scan_atom(pos) {
                        tokens.push(Token::new(
                            TokenValue::Atom(atom.to_string()),
                            Span::from_usize(start, end),
                        ));
                        pos = end;
                        continue;
                    }
                    let end = self.scan_word(pos);
                    if end == pos {
                        // Every reachable position is consumed by one of the
                        // rules above; report rather than loop forever.
                        // 上述规则应能消耗每个可达位置；报告错误而不是死循环。
                        return Err(Diagnostic::error(
                            DiagnosticKind::Lexer,
                            Span::point(pos),
                            "empty token (internal error)",
                        )
                        .with_code(ErrorCode::EmptyToken)
                        .with_label(Label::new(Span::from_usize(pos, pos + 1), "stuck here")));
                    }
                    tokens.push(Token::new(
                        TokenValue::Word(self.line[start..end].to_string()),
                        Span::from_usize(start, end),
                    ));
                    pos = end;
                }
            }
        }

        Ok(tokens)
    }

    fn char_at(&self, pos: usize) -> char {
        self.line[pos..].chars().next().unwrap()
    }

    /// Whether `pos` sits at the start of the line or after whitespace.
    /// `pos` 是否位于行首或空白之后。
    fn boundary_before(&self, pos: usize) -> bool {
        pos == 0
            || self.line[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace())
    }

    /// Whether `pos` sits at the end of the line or before whitespace.
    /// `pos` 是否位于行尾或空白之前。
    fn boundary_after(&self, pos: usize) -> bool {
        pos >= self.line.len()
            || self.line[pos..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace())
    }

    /// Capture an opaque `{…}` block, counting only nested braces.
    /// 捕获不透明的 `{…}` 块，只统计嵌套的花括号。
    ///
    /// The interior is taken verbatim, with no escapes and no
    /// tokenization; that is what lets brace blocks smuggle text
    /// containing unbalanced parens past the expression grammar.
    /// 内部内容按原样提取，不处理转义、不做词法分析；这让花括号块
    /// 能把包含不配对圆括号的文本带过表达式文法。
    fn scan_brace_block(&self, open: usize) -> Result<(String, usize), Diagnostic> {
        let mut depth = 1usize;
        for (off, ch) in self.line[open + 1..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let at = open + 1 + off;
                        return Ok((self.line[open + 1..at].to_string(), at + 1));
                    }
                }
                _ => {}
            }
        }
        Err(Diagnostic::error(
            DiagnosticKind::Lexer,
            Span::from_usize(open, open + 1),
            "this brace was never closed",
        )
        .with_code(ErrorCode::UnclosedBrace)
        .with_label(Label::new(
            Span::from_usize(open, open + 1),
            "opened here",
        )))
    }

    /// Scan a quoted string starting at `open` (which holds `quote`).
    /// 扫描从 `open` 开始、以 `quote` 为界的字符串。
    ///
    /// Returns the escape-processed value and the end offset, or `None`
    /// when no unescaped matching quote followed by whitespace/end
    /// exists, in which case the quote character degrades to free text.
    /// 返回处理过转义的值和结束偏移；若找不到后跟空白或行尾的未转义
    /// 配对引号则返回 `None`，此时引号字符退化为自由文本。
    fn scan_quoted(&self, open: usize, quote: char) -> Option<(String, usize)> {
        let mut value = String::new();
        let mut pos = open + quote.len_utf8();
        while pos < self.line.len() {
            let ch = self.char_at(pos);
            if ch == '\\' {
                let next_pos = pos + 1;
                if next_pos < self.line.len() {
                    let next = self.char_at(next_pos);
                    if !next.is_whitespace() {
                        value.push(unescape(next));
                        pos = next_pos + next.len_utf8();
                        continue;
                    }
                }
                value.push('\\');
                pos += 1;
            } else if ch == quote {
                let end = pos + quote.len_utf8();
                if self.boundary_after(end) {
                    return Some((value, end));
                }
                // An unescaped quote that cannot terminate the string
                // means this was never a string to begin with.
                // 无法作为终止符的未转义引号说明这里根本不是字符串。
                return None;
            } else {
                value.push(ch);
                pos += ch.len_utf8();
            }
        }
        None
    }

    /// Scan a numeric literal: `0x` hex, or decimal with optional sign,
    /// fraction, and signed exponent.
    /// 扫描数字字面量：`0x` 十六进制，或带可选符号、小数和带符号指数的
    /// 十进制。
    fn scan_number(&self, start: usize) -> Option<(TokenValue, usize)> {
        let rest = &self.line[start..];

        if let Some(hex) = rest.strip_prefix("0x") {
            let digits: usize = hex.chars().take_while(|c| c.is_ascii_hexdigit()).count();
            if digits > 0 {
                let end = start + 2 + digits;
                if let Ok(n) = i64::from_str_radix(&self.line[start + 2..end], 16) {
                    return Some((TokenValue::Int(n), end));
                }
                return None;
            }
        }

        let mut pos = start;
        if rest.starts_with('-') {
            pos += 1;
        }
        let int_digits = self.line[pos..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if int_digits == 0 {
            return None;
        }
        pos += int_digits;

        let mut is_float = false;
        if self.line[pos..].starts_with('.') {
            let frac_digits = self.line[pos + 1..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if frac_digits > 0 {
                pos += 1 + frac_digits;
                is_float = true;

                // Exponent only after a fraction, and only with an
                // explicit sign.
                // 指数只能跟在小数之后，且必须带显式符号。
                let after = &self.line[pos..];
                if after.starts_with('e') || after.starts_with('E') {
                    let signed = after[1..].starts_with('+') || after[1..].starts_with('-');
                    if signed {
                        let exp_digits = after[2..]
                            .chars()
                            .take_while(|c| c.is_ascii_digit())
                            .count();
                        if exp_digits > 0 {
                            pos += 2 + exp_digits;
                        }
                    }
                }
            }
        }

        let text = &self.line[start..pos];
        if is_float {
            text.parse::<f64>().ok().map(|f| (TokenValue::Float(f), pos))
        } else {
            match text.parse::<i64>() {
                Ok(n) => Some((TokenValue::Int(n), pos)),
                Err(_) => text.parse::<f64>().ok().map(|f| (TokenValue::Float(f), pos)),
            }
        }
    }

    /// Match a configured atom at `pos`, longest first.
    /// 在 `pos` 处匹配配置的 atom，最长优先。
    ///
    /// Atoms whose first and last characters are alphabetic only match
    /// at whitespace/string boundaries, so `in` never matches inside
    /// `inside`.
    /// 首尾字符均为字母的 atom 只在空白或行首行尾边界处匹配，因此 `in`
    /// 不会在 `inside` 内部匹配。
    fn scan_atom(&self, pos: usize) -> Option<(&'src str, usize)> {
        for &atom in &self.atoms {
            if !self.line[pos..].starts_with(atom) {
                continue;
            }
            let end = pos + atom.len();
            if wordy(atom) && !(self.boundary_before(pos) && self.boundary_after(end)) {
                continue;
            }
            return Some((atom, end));
        }
        None
    }

    /// Consume the maximal free-text run starting at `pos`.
    /// 消耗从 `pos` 开始的最长自由文本串。
    fn scan_word(&self, start: usize) -> usize {
        let mut pos = start;
        while pos < self.line.len() {
            let ch = self.char_at(pos);
            if ch.is_whitespace() || self.special_starts_at(pos, ch) {
                break;
            }
            pos += ch.len_utf8();
        }
        pos
    }

    /// Whether any higher-priority rule would consume `pos`.
    /// 是否有更高优先级的规则会消耗 `pos`。
    fn special_starts_at(&self, pos: usize, ch: char) -> bool {
        if matches!(ch, '(' | ')' | '[' | ']' | '{' | '}') {
            return true;
        }
        if (ch == '\'' || ch == '"')
            && self.boundary_before(pos)
            && self.scan_quoted(pos, ch).is_some()
        {
            return true;
        }
        if self.scan_number(pos).is_some() {
            return true;
        }
        self.scan_atom(pos).is_some()
    }
}

/// Whether an atom is subject to word-boundary matching.
/// atom 是否需要按单词边界匹配。
fn wordy(atom: &str) -> bool {
    atom.chars().next().is_some_and(|c| c.is_alphabetic())
        && atom.chars().next_back().is_some_and(|c| c.is_alphabetic())
}

/// Process one escaped character from a quoted string.
/// 处理带引号字符串中的一个转义字符。
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'e' => '\x1b',
        'o' => '{',
        'c' => '}',
        other => other,
    }
}
