//! Serialization
//!
//! Walks a node's subtree in document order, producing events that flow
//! through an explicit ordered list of filters into the writer. Match
//! highlighting is one such filter; with highlighting off (or no
//! filters) the stored document is reproduced as is.

pub mod events;
pub mod listener;
pub mod writer;

pub use events::{Event, MatchFilter};
pub use listener::MatchListener;
pub use writer::XmlWriter;

use events::dispatch;

use crate::dom::{NodeAccess, NodeKind, NodeRef};
use crate::error::{Error, Result};
use crate::query::MatchSet;

/// Reserved namespace of the highlight marker element
pub const MATCH_NS: &str = "http://textgram.dev/ns/match";
/// Prefix the marker is serialized with
pub const MATCH_PREFIX: &str = "tg";
/// Serialized marker name
pub const MATCH_NAME: &str = "tg:match";

/// Output option controlling match rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMatches {
    /// Matches are never rendered
    Off,
    /// Matched runs are wrapped in marker elements
    Elements,
}

/// Subtree serializer with a filter chain
pub struct Serializer<'a, A: NodeAccess> {
    access: &'a A,
    filters: Vec<Box<dyn MatchFilter + 'a>>,
}

impl<'a, A: NodeAccess> Serializer<'a, A> {
    /// Create a serializer with no filters
    pub fn new(access: &'a A) -> Self {
        Serializer {
            access,
            filters: Vec::new(),
        }
    }

    /// Create a serializer rendering one match set per the output option
    pub fn with_matches(access: &'a A, matches: &MatchSet, highlight: HighlightMatches) -> Self {
        let mut serializer = Self::new(access);
        if highlight == HighlightMatches::Elements && !matches.is_empty() {
            serializer.push_filter(Box::new(MatchListener::new(access, matches)));
        }
        serializer
    }

    /// Append a filter to the chain; events pass through filters in
    /// insertion order
    pub fn push_filter(&mut self, filter: Box<dyn MatchFilter + 'a>) {
        self.filters.push(filter);
    }

    /// Serialize a node's subtree
    pub fn serialize(&mut self, node: NodeRef) -> Result<String> {
        let mut writer = XmlWriter::new();
        self.emit(node, &mut writer)?;
        Ok(writer.finish())
    }

    fn emit(&mut self, node: NodeRef, writer: &mut XmlWriter) -> Result<()> {
        let n = self
            .access
            .node(node)
            .ok_or_else(|| Error::storage(format!("node {} not in store", node)))?;
        match n.kind {
            NodeKind::Element => {
                let name = self
                    .access
                    .raw_name(node)
                    .ok_or_else(|| Error::serialize(format!("element {} has no name", node)))?
                    .to_string();
                let attrs = self.access.attributes(node);
                let children = self.access.children(node);
                let empty = children.is_empty();
                self.route(
                    Event::ElementStart {
                        name: name.clone(),
                        attrs,
                        empty,
                    },
                    writer,
                );
                for child in children {
                    self.emit(child, writer)?;
                }
                if !empty {
                    self.route(Event::ElementEnd { name }, writer);
                }
            }
            NodeKind::Text => {
                let text = self.access.text(node).unwrap_or("").to_string();
                self.route(
                    Event::Text {
                        node: Some(node),
                        offset: 0,
                        text,
                    },
                    writer,
                );
            }
        }
        Ok(())
    }

    /// Fold one event through the filter chain into the writer
    fn route(&mut self, event: Event, writer: &mut XmlWriter) {
        let mut current = vec![event];
        for filter in &mut self.filters {
            let mut next = Vec::with_capacity(current.len());
            for ev in current {
                dispatch(filter.as_mut(), ev, &mut next);
            }
            current = next;
        }
        for ev in &current {
            writer.write(ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocStore;

    #[test]
    fn test_serialize_round_trip() {
        let xml = r#"<para id="p1">some paragraph with <hi>mixed</hi> content.</para>"#;
        let mut store = DocStore::new();
        let id = store.insert(xml).unwrap();
        let out = Serializer::new(&store)
            .serialize(store.root(id).unwrap())
            .unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn test_serialize_escapes_round_trip() {
        let xml = "<a>1 &amp; 2 &lt; 3</a>";
        let mut store = DocStore::new();
        let id = store.insert(xml).unwrap();
        let out = Serializer::new(&store)
            .serialize(store.root(id).unwrap())
            .unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut store = DocStore::new();
        let id = store.insert(r#"<a><b x="1"/></a>"#).unwrap();
        let out = Serializer::new(&store)
            .serialize(store.root(id).unwrap())
            .unwrap();
        assert_eq!(out, r#"<a><b x="1"/></a>"#);
    }

    #[test]
    fn test_serialize_unknown_node_is_error() {
        let store = DocStore::new();
        assert!(Serializer::new(&store).serialize(NodeRef::new(0, 0)).is_err());
    }
}
