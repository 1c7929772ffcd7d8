//! Document storage - arena-based representation of stored XML
//!
//! Documents live in a `DocStore` and are addressed through `NodeRef`
//! handles; nothing in the engine owns a document beyond this store.
//! The parser covers the construct set needed to persist documents:
//! elements, attributes, character data (with entity references and
//! CDATA sections), comments and processing instructions are skipped.
//!
//! Uses memchr for delimiter scanning.

use std::collections::HashMap;

use memchr::memchr;

use super::node::{Attribute, DocId, Node, NodeId, NodeRef};
use crate::config::QName;
use crate::error::{Error, Result};

/// Built-in namespace bound to the `xml` prefix
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Interned element or attribute name: serialized form plus resolved name
#[derive(Debug, Clone)]
pub struct NameEntry {
    /// Name as written in the document, prefix included
    pub raw: String,
    /// Resolved qualified name
    pub qname: QName,
}

/// An XML document stored in arena format
#[derive(Debug)]
pub struct Document {
    id: DocId,
    nodes: Vec<Node>,
    attributes: Vec<Attribute>,
    names: Vec<NameEntry>,
    texts: Vec<String>,
    root: Option<NodeId>,
}

impl Document {
    /// Parse a document from its serialized form
    pub fn parse(id: DocId, input: &str) -> Result<Self> {
        Parser::new(id, input).run()
    }

    /// Document id within the store
    #[inline]
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Root element id
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a node by id
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolved name of an element
    pub fn qname(&self, id: NodeId) -> Option<&QName> {
        let node = self.node(id)?;
        if !node.is_element() {
            return None;
        }
        self.names.get(node.name_id as usize).map(|e| &e.qname)
    }

    /// Serialized name of an element, prefix included
    pub fn raw_name(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        if !node.is_element() {
            return None;
        }
        self.names.get(node.name_id as usize).map(|e| e.raw.as_str())
    }

    /// Character content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        if !node.is_text() {
            return None;
        }
        self.texts.get(node.name_id as usize).map(String::as_str)
    }

    /// Attributes of an element as (serialized name, value) pairs
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let start = node.attr_start as usize;
        let end = start + node.attr_count as usize;
        self.attributes
            .get(start..end)
            .unwrap_or(&[])
            .iter()
            .filter_map(|a| {
                let name = self.names.get(a.name_id as usize)?;
                Some((name.raw.clone(), a.value.clone()))
            })
            .collect()
    }

    /// Child node ids in document order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut next = self.node(id).and_then(|n| n.first_child);
        while let Some(child) = next {
            out.push(child);
            next = self.node(child).and_then(|n| n.next_sibling);
        }
        out
    }
}

/// Store of parsed documents addressed by DocId
#[derive(Debug, Default)]
pub struct DocStore {
    docs: Vec<Option<Document>>,
}

impl DocStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store a document, returning its id
    pub fn insert(&mut self, input: &str) -> Result<DocId> {
        let id = self.docs.len() as DocId;
        let doc = Document::parse(id, input)?;
        self.docs.push(Some(doc));
        Ok(id)
    }

    /// Remove a document from the store
    pub fn remove(&mut self, id: DocId) -> Result<()> {
        match self.docs.get_mut(id as usize) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(Error::UnknownDocument(id)),
        }
    }

    /// Get a stored document
    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize).and_then(|d| d.as_ref())
    }

    /// Root element of a stored document
    pub fn root(&self, id: DocId) -> Option<NodeRef> {
        let doc = self.document(id)?;
        doc.root().map(|n| NodeRef::new(id, n))
    }

    /// All descendant-or-self elements of a document root with the given
    /// local name, in document order
    pub fn elements_by_name(&self, id: DocId, local: &str) -> Vec<NodeRef> {
        let Some(doc) = self.document(id) else {
            return Vec::new();
        };
        let Some(root) = doc.root() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node_id) = stack.pop() {
            if let Some(q) = doc.qname(node_id) {
                if q.local_name() == local {
                    out.push(NodeRef::new(id, node_id));
                }
            }
            let mut children = doc.children(node_id);
            children.reverse();
            stack.extend(children);
        }
        out.sort_unstable();
        out
    }
}

/// Access contract the engine consumes; the persistent storage layer
/// provides the production implementation, `DocStore` the in-memory one.
pub trait NodeAccess {
    /// Get a node by reference
    fn node(&self, r: NodeRef) -> Option<&Node>;

    /// Resolved name of an element node
    fn qname(&self, r: NodeRef) -> Option<&QName>;

    /// Serialized name of an element node
    fn raw_name(&self, r: NodeRef) -> Option<&str>;

    /// Character content of a text node
    fn text(&self, r: NodeRef) -> Option<&str>;

    /// Attributes as (serialized name, value) pairs
    fn attributes(&self, r: NodeRef) -> Vec<(String, String)>;

    /// Parent node
    fn parent(&self, r: NodeRef) -> Option<NodeRef>;

    /// Child nodes in document order
    fn children(&self, r: NodeRef) -> Vec<NodeRef>;

    /// Check whether `ancestor` is an ancestor-or-self of `node`
    fn is_ancestor_or_self(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        if ancestor.doc != node.doc {
            return false;
        }
        let mut current = Some(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }
}

impl NodeAccess for DocStore {
    fn node(&self, r: NodeRef) -> Option<&Node> {
        self.document(r.doc)?.node(r.node)
    }

    fn qname(&self, r: NodeRef) -> Option<&QName> {
        self.document(r.doc)?.qname(r.node)
    }

    fn raw_name(&self, r: NodeRef) -> Option<&str> {
        self.document(r.doc)?.raw_name(r.node)
    }

    fn text(&self, r: NodeRef) -> Option<&str> {
        self.document(r.doc)?.text(r.node)
    }

    fn attributes(&self, r: NodeRef) -> Vec<(String, String)> {
        self.document(r.doc)
            .map(|d| d.attributes(r.node))
            .unwrap_or_default()
    }

    fn parent(&self, r: NodeRef) -> Option<NodeRef> {
        let parent = self.document(r.doc)?.node(r.node)?.parent?;
        Some(NodeRef::new(r.doc, parent))
    }

    fn children(&self, r: NodeRef) -> Vec<NodeRef> {
        self.document(r.doc)
            .map(|d| {
                d.children(r.node)
                    .into_iter()
                    .map(|n| NodeRef::new(r.doc, n))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    doc: Document,
    /// Open element ids
    stack: Vec<NodeId>,
    /// In-scope namespace declarations: (prefix, uri); None uri undeclares
    ns_decls: Vec<(Option<String>, Option<String>)>,
    /// Declaration count per open element, for popping
    ns_marks: Vec<usize>,
    /// Interned names keyed by (raw, resolved)
    name_lookup: HashMap<(String, QName), u32>,
}

impl<'a> Parser<'a> {
    fn new(id: DocId, input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
            doc: Document {
                id,
                nodes: Vec::with_capacity(64),
                attributes: Vec::with_capacity(16),
                names: Vec::with_capacity(16),
                texts: Vec::with_capacity(32),
                root: None,
            },
            stack: Vec::with_capacity(16),
            ns_decls: Vec::new(),
            ns_marks: Vec::new(),
            name_lookup: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<Document> {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            match memchr(b'<', rest) {
                Some(lt) => {
                    if lt > 0 {
                        self.handle_text(self.pos, self.pos + lt)?;
                    }
                    self.pos += lt;
                    self.handle_markup()?;
                }
                None => {
                    self.handle_text(self.pos, self.input.len())?;
                    self.pos = self.input.len();
                }
            }
        }
        if let Some(&open) = self.stack.last() {
            let name = self.doc.raw_name(open).unwrap_or("?").to_string();
            return Err(Error::invalid_document(format!("unclosed element <{}>", name)));
        }
        if self.doc.root.is_none() {
            return Err(Error::invalid_document("no root element"));
        }
        Ok(self.doc)
    }

    /// Character data between markup
    fn handle_text(&mut self, start: usize, end: usize) -> Result<()> {
        let raw = self.slice(start, end)?;
        if self.stack.is_empty() {
            if raw.bytes().all(|b| b.is_ascii_whitespace()) {
                return Ok(());
            }
            return Err(Error::invalid_document("text content outside root element"));
        }
        let decoded = decode_entities(raw)?;
        self.add_text(decoded);
        Ok(())
    }

    /// Dispatch on the markup at `pos` (which points at '<')
    fn handle_markup(&mut self) -> Result<()> {
        match self.input.get(self.pos + 1) {
            Some(b'/') => self.handle_end_tag(),
            Some(b'?') => self.skip_until("?>"),
            Some(b'!') => {
                if self.input[self.pos..].starts_with(b"<!--") {
                    self.skip_until("-->")
                } else if self.input[self.pos..].starts_with(b"<![CDATA[") {
                    self.handle_cdata()
                } else {
                    // DOCTYPE and other declarations
                    self.skip_until(">")
                }
            }
            Some(_) => self.handle_start_tag(),
            None => Err(Error::invalid_document("unexpected end of input after '<'")),
        }
    }

    fn handle_end_tag(&mut self) -> Result<()> {
        let name_start = self.pos + 2;
        let gt = memchr(b'>', &self.input[name_start..])
            .map(|i| name_start + i)
            .ok_or_else(|| Error::invalid_document("unterminated end tag"))?;
        let name = self.slice(name_start, gt)?.trim_end().to_string();
        let open = self
            .stack
            .pop()
            .ok_or_else(|| Error::invalid_document(format!("unexpected </{}>", name)))?;
        let open_name = self.doc.raw_name(open).unwrap_or("");
        if open_name != name {
            return Err(Error::invalid_document(format!(
                "tag mismatch: <{}> closed with </{}>",
                open_name, name
            )));
        }
        self.pop_ns_scope();
        self.pos = gt + 1;
        Ok(())
    }

    fn handle_cdata(&mut self) -> Result<()> {
        let content_start = self.pos + "<![CDATA[".len();
        let end = find(self.input, content_start, b"]]>")
            .ok_or_else(|| Error::invalid_document("unterminated CDATA section"))?;
        if self.stack.is_empty() {
            return Err(Error::invalid_document("CDATA outside root element"));
        }
        let content = self.slice(content_start, end)?.to_string();
        self.add_text(content);
        self.pos = end + 3;
        Ok(())
    }

    fn handle_start_tag(&mut self) -> Result<()> {
        let name_start = self.pos + 1;
        let mut p = name_start;
        while p < self.input.len() && !matches!(self.input[p], b' ' | b'\t' | b'\n' | b'\r' | b'/' | b'>') {
            p += 1;
        }
        if p == name_start {
            return Err(Error::invalid_document("missing element name"));
        }
        let raw_name = self.slice(name_start, p)?.to_string();

        // Attributes: (raw name, decoded value)
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut empty = false;
        loop {
            while p < self.input.len() && self.input[p].is_ascii_whitespace() {
                p += 1;
            }
            match self.input.get(p) {
                Some(b'>') => {
                    p += 1;
                    break;
                }
                Some(b'/') => {
                    if self.input.get(p + 1) != Some(&b'>') {
                        return Err(Error::invalid_document("expected '>' after '/'"));
                    }
                    empty = true;
                    p += 2;
                    break;
                }
                Some(_) => {
                    let (attr, next) = self.parse_attribute(p)?;
                    attrs.push(attr);
                    p = next;
                }
                None => return Err(Error::invalid_document("unterminated start tag")),
            }
        }

        if self.stack.is_empty() && self.doc.root.is_some() {
            return Err(Error::invalid_document("multiple root elements"));
        }

        self.push_ns_scope(&attrs);
        let result = self.add_element(&raw_name, &attrs);
        let elem_id = match result {
            Ok(id) => id,
            Err(e) => {
                self.pop_ns_scope();
                return Err(e);
            }
        };

        if empty {
            self.pop_ns_scope();
        } else {
            self.stack.push(elem_id);
        }
        self.pos = p;
        Ok(())
    }

    fn parse_attribute(&mut self, mut p: usize) -> Result<((String, String), usize)> {
        let name_start = p;
        while p < self.input.len() && !matches!(self.input[p], b'=' | b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/') {
            p += 1;
        }
        let name = self.slice(name_start, p)?.to_string();
        while p < self.input.len() && self.input[p].is_ascii_whitespace() {
            p += 1;
        }
        if self.input.get(p) != Some(&b'=') {
            return Err(Error::invalid_document(format!("attribute '{}' has no value", name)));
        }
        p += 1;
        while p < self.input.len() && self.input[p].is_ascii_whitespace() {
            p += 1;
        }
        let quote = match self.input.get(p) {
            Some(q @ (b'"' | b'\'')) => *q,
            _ => {
                return Err(Error::invalid_document(format!(
                    "attribute '{}' value is not quoted",
                    name
                )))
            }
        };
        p += 1;
        let value_start = p;
        let close = memchr(quote, &self.input[p..])
            .map(|i| p + i)
            .ok_or_else(|| Error::invalid_document("unterminated attribute value"))?;
        let value = decode_entities(self.slice(value_start, close)?)?;
        Ok(((name, value), close + 1))
    }

    /// Record namespace declarations carried by a start tag
    fn push_ns_scope(&mut self, attrs: &[(String, String)]) {
        let mut count = 0;
        for (name, value) in attrs {
            let uri = if value.is_empty() { None } else { Some(value.clone()) };
            if name == "xmlns" {
                self.ns_decls.push((None, uri));
                count += 1;
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                self.ns_decls.push((Some(prefix.to_string()), uri));
                count += 1;
            }
        }
        self.ns_marks.push(count);
    }

    fn pop_ns_scope(&mut self) {
        if let Some(count) = self.ns_marks.pop() {
            for _ in 0..count {
                self.ns_decls.pop();
            }
        }
    }

    /// Resolve a prefix (None = default namespace) against in-scope declarations
    fn lookup_ns(&self, prefix: Option<&str>) -> Option<Option<&str>> {
        if prefix == Some("xml") {
            return Some(Some(XML_NS));
        }
        for (p, uri) in self.ns_decls.iter().rev() {
            if p.as_deref() == prefix {
                return Some(uri.as_deref());
            }
        }
        if prefix.is_none() {
            // No default declaration in scope means no namespace
            return Some(None);
        }
        None
    }

    fn resolve(&self, raw: &str, is_attr: bool) -> Result<QName> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let uri = self
                    .lookup_ns(Some(prefix))
                    .ok_or_else(|| Error::invalid_document(format!("unbound prefix '{}'", prefix)))?;
                match uri {
                    Some(ns) => Ok(QName::new(ns, local)),
                    None => Err(Error::invalid_document(format!("unbound prefix '{}'", prefix))),
                }
            }
            None => {
                if is_attr {
                    // Unprefixed attributes are in no namespace
                    return Ok(QName::local(raw));
                }
                match self.lookup_ns(None).flatten() {
                    Some(ns) => Ok(QName::new(ns, raw)),
                    None => Ok(QName::local(raw)),
                }
            }
        }
    }

    fn intern_name(&mut self, raw: &str, qname: QName) -> u32 {
        let key = (raw.to_string(), qname);
        if let Some(&id) = self.name_lookup.get(&key) {
            return id;
        }
        let id = self.doc.names.len() as u32;
        self.doc.names.push(NameEntry {
            raw: key.0.clone(),
            qname: key.1.clone(),
        });
        self.name_lookup.insert(key, id);
        id
    }

    fn add_element(&mut self, raw_name: &str, attrs: &[(String, String)]) -> Result<NodeId> {
        let qname = self.resolve(raw_name, false)?;
        let name_id = self.intern_name(raw_name, qname);
        let depth = self.stack.len() as u16;
        let parent = self.stack.last().copied();
        let mut node = Node::element(name_id, parent, depth);

        if !attrs.is_empty() {
            node.attr_start = self.doc.attributes.len() as u32;
            node.attr_count = attrs.len().min(u16::MAX as usize) as u16;
            for (name, value) in attrs {
                // xmlns declarations stay in the attribute list so the
                // document serializes back exactly as stored
                let attr_qname = self.resolve(name, true)?;
                let attr_name_id = self.intern_name(name, attr_qname);
                self.doc.attributes.push(Attribute {
                    name_id: attr_name_id,
                    value: value.clone(),
                });
            }
        }

        let id = self.link(node);
        if self.doc.root.is_none() {
            self.doc.root = Some(id);
        }
        Ok(id)
    }

    fn add_text(&mut self, content: String) {
        // Merge with a preceding text sibling so adjacent character data
        // (e.g. around a CDATA section) forms one node
        let parent = self.stack.last().copied();
        if let Some(p) = parent {
            if let Some(last) = self.doc.nodes[p as usize].last_child {
                if self.doc.nodes[last as usize].is_text() {
                    let text_id = self.doc.nodes[last as usize].name_id;
                    self.doc.texts[text_id as usize].push_str(&content);
                    return;
                }
            }
        }
        let text_id = self.doc.texts.len() as u32;
        self.doc.texts.push(content);
        let depth = self.stack.len() as u16;
        let node = Node::text(text_id, parent, depth);
        self.link(node);
    }

    /// Append a node to the arena and wire it into its parent
    fn link(&mut self, node: Node) -> NodeId {
        let id = self.doc.nodes.len() as NodeId;
        let parent = node.parent;
        self.doc.nodes.push(node);
        if let Some(p) = parent {
            let parent_node = &mut self.doc.nodes[p as usize];
            match parent_node.last_child {
                None => {
                    parent_node.first_child = Some(id);
                    parent_node.last_child = Some(id);
                }
                Some(prev) => {
                    parent_node.last_child = Some(id);
                    self.doc.nodes[prev as usize].next_sibling = Some(id);
                }
            }
        }
        id
    }

    fn skip_until(&mut self, marker: &str) -> Result<()> {
        match find(self.input, self.pos, marker.as_bytes()) {
            Some(at) => {
                self.pos = at + marker.len();
                Ok(())
            }
            None => Err(Error::invalid_document(format!("unterminated markup, expected '{}'", marker))),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..end])
            .map_err(|_| Error::invalid_document("invalid UTF-8"))
    }
}

/// Find a byte pattern at or after `from`, anchored on its first byte
fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    let mut pos = from;
    while pos + needle.len() <= haystack.len() {
        match memchr(needle[0], &haystack[pos..]) {
            Some(i) => {
                let at = pos + i;
                if haystack[at..].starts_with(needle) {
                    return Some(at);
                }
                pos = at + 1;
            }
            None => return None,
        }
    }
    None
}

/// Decode the predefined entities and character references
fn decode_entities(raw: &str) -> Result<String> {
    if memchr(b'&', raw.as_bytes()).is_none() {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail
            .find(';')
            .ok_or_else(|| Error::invalid_document("unterminated entity reference"))?;
        let entity = &tail[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                let ch = code.and_then(char::from_u32).ok_or_else(|| {
                    Error::invalid_document(format!("unknown entity '&{};'", entity))
                })?;
                out.push(ch);
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
