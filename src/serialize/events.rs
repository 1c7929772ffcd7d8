//! Serialization events
//!
//! The serializer turns a node walk into a flat event stream and folds
//! each event through an ordered list of filters before it reaches the
//! writer. Filters implement the small capability trait below and
//! forward by pushing into `out`; the default implementations forward
//! unchanged, so a filter only overrides what it rewrites.

use crate::dom::NodeRef;

/// One serialization event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Element start tag
    ElementStart {
        /// Serialized name, prefix included
        name: String,
        /// Attributes as (serialized name, decoded value) pairs
        attrs: Vec<(String, String)>,
        /// Whether the element has no content and closes itself
        empty: bool,
    },
    /// Character content, split into pieces as filters rewrite it
    Text {
        /// Originating text node; None for injected content
        node: Option<NodeRef>,
        /// Character offset of this piece within the originating node
        offset: usize,
        /// The piece's characters
        text: String,
    },
    /// Element end tag
    ElementEnd {
        /// Serialized name, prefix included
        name: String,
    },
}

/// Capability interface for serialization-time filters
pub trait MatchFilter {
    /// Handle an element start event
    fn on_element_start(&mut self, event: Event, out: &mut Vec<Event>) {
        out.push(event);
    }

    /// Handle a text event
    fn on_text(&mut self, event: Event, out: &mut Vec<Event>) {
        out.push(event);
    }

    /// Handle an element end event
    fn on_element_end(&mut self, event: Event, out: &mut Vec<Event>) {
        out.push(event);
    }
}

/// Route one event to the matching filter capability
pub(crate) fn dispatch(filter: &mut dyn MatchFilter, event: Event, out: &mut Vec<Event>) {
    match event {
        Event::ElementStart { .. } => filter.on_element_start(event, out),
        Event::Text { .. } => filter.on_text(event, out),
        Event::ElementEnd { .. } => filter.on_element_end(event, out),
    }
}
