//! Match highlighting filter
//!
//! Wraps matched character runs in marker elements while the serializer
//! streams a node's subtree. The filter owns exactly one match set,
//! keyed by the text nodes the spans cover, so serializing any subtree
//! containing those text nodes renders the markers: a match found on a
//! paragraph still highlights when only a child of that paragraph is
//! serialized. Structural events pass through unchanged. Several
//! listeners can be stacked, each injecting markers only for spans it
//! owns; text pieces keep their originating node and offset so later
//! filters in the chain still find their own spans.

use std::collections::HashMap;

use super::events::{Event, MatchFilter};
use super::{MATCH_NAME, MATCH_NS, MATCH_PREFIX};
use crate::collect::char_slice;
use crate::dom::{NodeAccess, NodeRef};
use crate::query::MatchSet;

/// Serialization filter rendering one match set as inline markers
pub struct MatchListener {
    /// Covered ranges per text node, sorted and non-overlapping
    spans: HashMap<NodeRef, Vec<(usize, usize)>>,
}

impl MatchListener {
    /// Build a listener from a match set.
    ///
    /// Spans are validated against the stored text: a span whose node is
    /// gone or whose offsets no longer fit (the document changed between
    /// query and serialization) is stale and skipped. Overlapping ranges
    /// are clipped at the previous range's end so markers nest properly;
    /// adjacent ranges stay separate and render as adjacent marker pairs.
    pub fn new<A: NodeAccess>(access: &A, matches: &MatchSet) -> Self {
        let mut spans = HashMap::new();
        for (node, ranges) in matches.text_node_spans() {
            let Some(text) = access.text(node) else {
                log::warn!("stale match spans on {}: text node is gone", node);
                continue;
            };
            let len = text.chars().count();
            let mut kept: Vec<(usize, usize)> = ranges
                .into_iter()
                .filter(|&(start, end)| {
                    if start < end && end <= len {
                        true
                    } else {
                        log::warn!("stale match span {}..{} on {} skipped", start, end, node);
                        false
                    }
                })
                .collect();
            kept.sort_unstable();
            let mut clipped: Vec<(usize, usize)> = Vec::with_capacity(kept.len());
            for (start, end) in kept {
                let start = match clipped.last() {
                    Some(&(_, prev_end)) => start.max(prev_end),
                    None => start,
                };
                if start < end {
                    clipped.push((start, end));
                }
            }
            if !clipped.is_empty() {
                spans.insert(node, clipped);
            }
        }
        MatchListener { spans }
    }

    /// Check whether the listener has anything to render
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl MatchFilter for MatchListener {
    fn on_text(&mut self, event: Event, out: &mut Vec<Event>) {
        let Event::Text {
            node: Some(node),
            offset,
            text,
        } = event
        else {
            out.push(event);
            return;
        };
        let Some(ranges) = self.spans.get(&node) else {
            out.push(Event::Text {
                node: Some(node),
                offset,
                text,
            });
            return;
        };

        let window_end = offset + text.chars().count();
        let mut cursor = offset;
        let mut pieces = Vec::new();
        for &(start, end) in ranges {
            let start = start.max(cursor);
            let end = end.min(window_end);
            if start >= end {
                continue;
            }
            if start > cursor {
                pieces.push(piece(node, &text, offset, cursor, start));
            }
            pieces.push(marker_start());
            pieces.push(piece(node, &text, offset, start, end));
            pieces.push(marker_end());
            cursor = end;
        }
        if pieces.is_empty() {
            // All ranges fall outside this piece
            out.push(Event::Text {
                node: Some(node),
                offset,
                text,
            });
            return;
        }
        if cursor < window_end {
            pieces.push(piece(node, &text, offset, cursor, window_end));
        }
        out.append(&mut pieces);
    }
}

/// Slice one outgoing text piece; `start`/`end` are node offsets
fn piece(node: NodeRef, text: &str, window_offset: usize, start: usize, end: usize) -> Event {
    let content = char_slice(text, start - window_offset, end - window_offset).unwrap_or("");
    Event::Text {
        node: Some(node),
        offset: start,
        text: content.to_string(),
    }
}

fn marker_start() -> Event {
    Event::ElementStart {
        name: MATCH_NAME.to_string(),
        attrs: vec![(format!("xmlns:{}", MATCH_PREFIX), MATCH_NS.to_string())],
        empty: false,
    }
}

fn marker_end() -> Event {
    Event::ElementEnd {
        name: MATCH_NAME.to_string(),
    }
}
