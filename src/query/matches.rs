//! Verified matches and their attribution
//!
//! A `Match` is one verified occurrence of a queried phrase: the node the
//! predicate was evaluated against plus the text-node spans covering the
//! matched characters. Matches live only long enough to drive one
//! serialization pass.

use std::collections::HashMap;

use crate::collect::{LogicalText, TextSpan};
use crate::dom::NodeRef;

/// One verified occurrence of a phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Node the predicate was evaluated against
    pub owner: NodeRef,
    /// The matched characters
    pub text: String,
    /// Covered runs, non-overlapping, in document order; their
    /// concatenated content equals `text`
    pub spans: Vec<TextSpan>,
}

/// Matches collected during one query evaluation, in encounter order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    matches: Vec<Match>,
}

impl MatchSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no matches were recorded
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of matches
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Record a match
    pub fn insert(&mut self, m: Match) {
        self.matches.push(m);
    }

    /// All matches in encounter order
    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    /// Matches attributed to one owner, in encounter order
    pub fn matches_for(&self, owner: NodeRef) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.owner == owner)
    }

    /// Distinct owners in encounter order
    pub fn owners(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for m in &self.matches {
            if !out.contains(&m.owner) {
                out.push(m.owner);
            }
        }
        out
    }

    /// Fold another set into this one; matches from different predicates
    /// coexist without merging
    pub fn merge(&mut self, other: MatchSet) {
        self.matches.extend(other.matches);
    }

    /// Covered character ranges grouped by text node, for rendering
    pub fn text_node_spans(&self) -> HashMap<NodeRef, Vec<(usize, usize)>> {
        let mut out: HashMap<NodeRef, Vec<(usize, usize)>> = HashMap::new();
        for m in &self.matches {
            for span in &m.spans {
                out.entry(span.node).or_default().push((span.start, span.end));
            }
        }
        out
    }
}

/// Map a verified character range of a logical text back to the text
/// nodes it touches, clipping at the range boundaries.
///
/// Returns one span per touched text node, in document order; the
/// concatenation of the spans' characters equals the matched substring.
pub fn attribute_range(logical: &LogicalText, start: usize, end: usize) -> Vec<TextSpan> {
    let mut out = Vec::new();
    for entry in &logical.entries {
        let entry_start = entry.offset;
        let entry_end = entry.offset + entry.span.len();
        let overlap_start = start.max(entry_start);
        let overlap_end = end.min(entry_end);
        if overlap_start < overlap_end {
            out.push(TextSpan::new(
                entry.span.node,
                entry.span.start + (overlap_start - entry_start),
                entry.span.start + (overlap_end - entry_start),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{collect, Boundary};
    use crate::config::{IndexConfig, IndexKind, NgramOptions, QName};
    use crate::dom::{DocStore, NodeAccess};

    fn para_logical_text() -> (DocStore, LogicalText) {
        let mut store = DocStore::new();
        let id = store
            .insert("<para>some paragraph with <hi>mixed</hi> content.</para>")
            .unwrap();
        let para = store.root(id).unwrap();
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        config.declare(QName::local("para"), IndexKind::Ngram).unwrap();
        let lt = collect(&store, para, &config, Boundary::None);
        (store, lt)
    }

    #[test]
    fn test_attribute_range_within_one_node() {
        let (_, lt) = para_logical_text();
        // "mixed" at 20..25 sits entirely in the hi text node
        let spans = attribute_range(&lt, 20, 25);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 5));
    }

    #[test]
    fn test_attribute_range_across_nodes() {
        let (store, lt) = para_logical_text();
        // "with mixed content" at 15..33 touches three text nodes
        let spans = attribute_range(&lt, 15, 33);
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start, spans[0].end), (15, 20));
        assert_eq!((spans[1].start, spans[1].end), (0, 5));
        assert_eq!((spans[2].start, spans[2].end), (0, 8));
        // Concatenated span content equals the matched substring
        let joined: String = spans
            .iter()
            .map(|s| {
                crate::collect::char_slice(store.text(s.node).unwrap(), s.start, s.end).unwrap()
            })
            .collect();
        assert_eq!(joined, "with mixed content");
    }

    #[test]
    fn test_attribute_range_clips_mid_node() {
        let (_, lt) = para_logical_text();
        // "content" at 26..33 starts one character into the third node
        let spans = attribute_range(&lt, 26, 33);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (1, 8));
    }

    #[test]
    fn test_match_set_order_and_merge() {
        let owner = NodeRef::new(0, 1);
        let node = NodeRef::new(0, 2);
        let mut a = MatchSet::new();
        a.insert(Match {
            owner,
            text: "x".into(),
            spans: vec![TextSpan::new(node, 0, 1)],
        });
        let mut b = MatchSet::new();
        b.insert(Match {
            owner,
            text: "y".into(),
            spans: vec![TextSpan::new(node, 2, 3)],
        });
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.owners(), vec![owner]);
        let texts: Vec<_> = a.matches_for(owner).map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "y"]);
        assert_eq!(a.text_node_spans()[&node], vec![(0, 1), (2, 3)]);
    }
}
