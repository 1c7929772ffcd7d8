//! Text collection
//!
//! Flattens the descendant text of a scope node into one logical string
//! with a map back to the originating text nodes. Adjacent text across
//! element boundaries is treated as continuous: no separators are
//! inserted. Each configured scope computes its own logical text starting
//! at itself, so the same characters may appear in several logical texts
//! rooted at different scopes; that duplication is what lets queries
//! against an inner scope and an outer scope both find the same content.
//!
//! All offsets are character offsets.

use crate::config::IndexConfig;
use crate::dom::{NodeAccess, NodeRef};

/// A contiguous run inside one text node's character content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextSpan {
    /// The text node
    pub node: NodeRef,
    /// Start character offset within the node, inclusive
    pub start: usize,
    /// End character offset within the node, exclusive
    pub end: usize,
}

impl TextSpan {
    /// Create a new span
    pub const fn new(node: NodeRef, start: usize, end: usize) -> Self {
        TextSpan { node, start, end }
    }

    /// Length in characters
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if this span is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One stretch of the concatenation mapped back to its text node
#[derive(Debug, Clone, Copy)]
pub struct TextEntry {
    /// Covered run of the originating text node
    pub span: TextSpan,
    /// Character offset of the run within the concatenation
    pub offset: usize,
}

/// Flattened string view of a scope's descendant text
#[derive(Debug, Clone)]
pub struct LogicalText {
    /// The scope node this text was collected from
    pub scope: NodeRef,
    /// Concatenated character content
    pub text: String,
    /// Offset map, in document order
    pub entries: Vec<TextEntry>,
}

impl LogicalText {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Slice by character offsets
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        char_slice(&self.text, start, end)
    }

    /// Check that `phrase` occurs at character offset `at`, exactly as stored
    pub fn verify(&self, at: usize, phrase: &str) -> bool {
        self.slice(at, at + phrase.chars().count()) == Some(phrase)
    }
}

/// Descent control for collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Collect all descendant text
    None,
    /// Stop descent at any descendant that is itself a configured scope
    NestedScopes,
}

/// Collect a scope node's descendant text in document order
pub fn collect<A: NodeAccess>(
    access: &A,
    scope: NodeRef,
    config: &IndexConfig,
    boundary: Boundary,
) -> LogicalText {
    let mut out = LogicalText {
        scope,
        text: String::new(),
        entries: Vec::new(),
    };
    let mut offset = 0;
    descend(access, scope, scope, config, boundary, &mut out, &mut offset);
    out
}

fn descend<A: NodeAccess>(
    access: &A,
    scope: NodeRef,
    node: NodeRef,
    config: &IndexConfig,
    boundary: Boundary,
    out: &mut LogicalText,
    offset: &mut usize,
) {
    for child in access.children(node) {
        if let Some(content) = access.text(child) {
            let len = content.chars().count();
            if len == 0 {
                continue;
            }
            out.text.push_str(content);
            out.entries.push(TextEntry {
                span: TextSpan::new(child, 0, len),
                offset: *offset,
            });
            *offset += len;
            continue;
        }
        if boundary == Boundary::NestedScopes && child != scope {
            if let Some(qname) = access.qname(child) {
                if config.is_scope(qname) {
                    continue;
                }
            }
        }
        descend(access, scope, child, config, boundary, out, offset);
    }
}

/// Slice a string by character offsets
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> Option<&str> {
    if end < start {
        return None;
    }
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    let byte_start = indices.by_ref().nth(start)?;
    if end == start {
        return Some(&s[byte_start..byte_start]);
    }
    let byte_end = indices.nth(end - start - 1)?;
    Some(&s[byte_start..byte_end])
}
