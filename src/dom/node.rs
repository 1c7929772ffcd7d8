//! XML node representation
//!
//! Uses NodeId (u32) indices into a per-document arena for compact,
//! cache-friendly node references. A NodeRef pairs a document id with a
//! node id and is the stable handle the rest of the engine holds on to.

use std::fmt;

/// Compact node identifier (index into a document's arena)
pub type NodeId = u32;

/// Identifier of a document within a store
pub type DocId = u32;

/// Stable reference to a node in a stored document.
///
/// Ordered by (document, node); node ids are assigned in document order,
/// so the derived ordering is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    /// Owning document
    pub doc: DocId,
    /// Node within the document
    pub node: NodeId,
}

impl NodeRef {
    /// Create a new reference
    #[inline]
    pub const fn new(doc: DocId, node: NodeId) -> Self {
        NodeRef { doc, node }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc, self.node)
    }
}

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Text content
    Text,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the root element)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into the name table (elements) or text table (text nodes)
    pub name_id: u32,
    /// Start of attributes in the attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u16,
    /// Depth in the document tree
    pub depth: u16,
}

impl Node {
    /// Create a new element node
    pub fn element(name_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind: NodeKind::Element,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name_id,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Create a new text node
    pub fn text(text_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind: NodeKind::Text,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name_id: text_id,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Index into the name table
    pub name_id: u32,
    /// Decoded attribute value
    pub value: String,
}
