//! The scope stack.
//!
//! A flat stack of variable frames with boundary markers. A boundary
//! separates a function activation's captured closure from the caller's
//! dynamic frames: reads and writes stop at the nearest boundary, so a
//! function sees its own frames and its closure but never its caller's
//! locals.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A variable frame. Shared ownership with interior mutability: closures
/// alias frames, and mutation through one holder is visible to all.
pub type Frame = Rc<RefCell<HashMap<String, Value>>>;

/// One entry of the scope stack.
pub enum ScopeEntry {
    Frame(Frame),
    Boundary,
}

/// The scope stack, innermost frame last. Always holds at least one
/// frame.
pub struct ScopeStack {
    entries: Vec<ScopeEntry>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            entries: vec![ScopeEntry::Frame(Frame::default())],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unwind to a previously recorded depth.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn push_boundary(&mut self) {
        self.entries.push(ScopeEntry::Boundary);
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.entries.push(ScopeEntry::Frame(frame));
    }

    /// Look a variable up, scanning innermost to outermost and stopping
    /// at (not crossing) the nearest boundary.
    pub fn read(&self, name: &str) -> Option<Value> {
        for entry in self.entries.iter().rev() {
            match entry {
                ScopeEntry::Boundary => return None,
                ScopeEntry::Frame(frame) => {
                    if let Some(value) = frame.borrow().get(name) {
                        return Some(value.clone());
                    }
                }
            }
        }
        None
    }

    /// Assign a variable: mutate the first frame already holding `name`
    /// within the boundary-bounded scan, else bind it in the innermost
    /// frame. Assignment is function-local by default, never implicitly
    /// global.
    pub fn write(&mut self, name: &str, value: Value) {
        for entry in self.entries.iter().rev() {
            match entry {
                ScopeEntry::Boundary => break,
                ScopeEntry::Frame(frame) => {
                    if frame.borrow().contains_key(name) {
                        frame.borrow_mut().insert(name.to_string(), value);
                        return;
                    }
                }
            }
        }
        self.bind(name, value);
    }

    /// Bind directly in the innermost frame, shadowing any outer binding.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.innermost()
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    fn innermost(&self) -> &Frame {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| match entry {
                ScopeEntry::Frame(frame) => Some(frame),
                ScopeEntry::Boundary => None,
            })
            .expect("scope stack always holds a frame")
    }

    /// Capture the closure for a new function value.
    ///
    /// With boundaries present the caller's own activation (everything
    /// from the first through the last boundary) is dropped, keeping
    /// what lies lexically outside it; with none, the whole stack is
    /// captured. Frames are captured by shared handle, never copied.
    pub fn capture(&self) -> Vec<Frame> {
        let boundary_at = |entry: &ScopeEntry| matches!(entry, ScopeEntry::Boundary);
        let frames = |entries: &[ScopeEntry]| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    ScopeEntry::Frame(frame) => Some(frame.clone()),
                    ScopeEntry::Boundary => None,
                })
                .collect::<Vec<_>>()
        };

        match self.entries.iter().position(boundary_at) {
            None => frames(&self.entries),
            Some(first) => {
                let last = self
                    .entries
                    .iter()
                    .rposition(boundary_at)
                    .expect("position found a boundary");
                let mut captured = frames(&self.entries[..first]);
                captured.extend(frames(&self.entries[last + 1..]));
                captured
            }
        }
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
