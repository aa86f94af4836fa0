//! Source line span tracking.
//! 源码行范围跟踪。

use std::fmt;

/// A byte range within a single source line.
/// 单行源码中的字节范围。
///
/// Quill programs are structured documents whose leaves are one-line
/// instruction strings, so spans are always relative to the line being
/// parsed rather than to a whole file.
/// Quill 程序是结构化文档，叶子是单行指令字符串，所以范围总是相对于
/// 正在解析的那一行，而不是整个文件。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive). / 起始字节偏移（包含）。
    pub start: u32,
    /// End byte offset (exclusive). / 结束字节偏移（不包含）。
    pub end: u32,
}

impl Span {
    /// A span carrying no position information.
    /// 不携带位置信息的范围。
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn from_usize(start: usize, end: usize) -> Self {
        Span {
            start: start as u32,
            end: end as u32,
        }
    }

    /// A zero-width span at the given offset.
    /// 给定偏移处的零宽范围。
    pub fn point(at: usize) -> Self {
        Span::from_usize(at, at)
    }

    /// The smallest span covering both `self` and `other`.
    /// 同时覆盖 `self` 和 `other` 的最小范围。
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The byte range for slicing the owning line.
    /// 用于切片所属行的字节区间。
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
