//! Integration tests for quill-common crate.

use quill_common::Span;

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start, 10);
    assert_eq!(merged.end, 30);
}

#[test]
fn test_span_merge_disjoint() {
    let a = Span::from_usize(0, 3);
    let b = Span::from_usize(8, 12);
    assert_eq!(a.merge(b), Span::from_usize(0, 12));
}

#[test]
fn test_span_len() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.len(), 10);
}

#[test]
fn test_span_is_empty() {
    assert!(Span::point(5).is_empty());
    assert!(!Span::from_usize(5, 10).is_empty());
}

#[test]
fn test_span_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.range(), 5..15);
}

#[test]
fn test_point_span() {
    let span = Span::point(7);
    assert_eq!(span.start, 7);
    assert_eq!(span.end, 7);
}
