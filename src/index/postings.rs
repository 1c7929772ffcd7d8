//! Posting store
//!
//! Logical mapping from (scope name, gram) to an ordered set of
//! occurrences. Append-only during a build, point and prefix lookups at
//! query time. The ordered key space is what makes prefix scans for
//! short search strings possible. Physical persistence is the storage
//! engine's concern; this is the access contract the rest of the engine
//! programs against.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::config::QName;
use crate::dom::{DocId, NodeRef};

/// Key of a postings list
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostingKey {
    /// Scope element name the gram was indexed under
    pub scope: QName,
    /// The gram
    pub gram: String,
}

/// One indexed occurrence of a gram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Occurrence {
    /// The scope node whose logical text contains the gram
    /// (the document id travels inside the reference)
    pub node: NodeRef,
    /// Starting character offset of the gram in the scope's logical text
    pub offset: usize,
}

/// In-memory posting store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingStore {
    map: BTreeMap<PostingKey, Vec<Occurrence>>,
}

impl PostingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one occurrence, keeping the list ordered and duplicate-free
    pub fn insert(&mut self, scope: &QName, gram: &str, occurrence: Occurrence) {
        let key = PostingKey {
            scope: scope.clone(),
            gram: gram.to_string(),
        };
        let list = self.map.entry(key).or_default();
        if let Err(at) = list.binary_search(&occurrence) {
            list.insert(at, occurrence);
        }
    }

    /// Occurrences for an exact (scope, gram) key
    pub fn lookup(&self, scope: &QName, gram: &str) -> &[Occurrence] {
        let key = PostingKey {
            scope: scope.clone(),
            gram: gram.to_string(),
        };
        self.map.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All postings lists for a scope whose gram starts with `prefix`;
    /// an empty prefix scans the whole scope
    pub fn scan_prefix<'a>(
        &'a self,
        scope: &'a QName,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [Occurrence])> + 'a {
        let from = PostingKey {
            scope: scope.clone(),
            gram: prefix.to_string(),
        };
        self.map
            .range((Bound::Included(from), Bound::Unbounded))
            .take_while(move |(key, _)| key.scope == *scope && key.gram.starts_with(prefix))
            .map(|(key, list)| (key.gram.as_str(), list.as_slice()))
    }

    /// Remove every posting emitted for one scope node (exact-replacement
    /// support: called before re-indexing that node)
    pub fn remove_scope_node(&mut self, scope: &QName, node: NodeRef) {
        self.map.retain(|key, list| {
            if key.scope != *scope {
                return true;
            }
            list.retain(|occ| occ.node != node);
            !list.is_empty()
        });
    }

    /// Remove every posting pointing into a document
    pub fn remove_document(&mut self, doc: DocId) {
        self.map.retain(|_, list| {
            list.retain(|occ| occ.node.doc != doc);
            !list.is_empty()
        });
    }

    /// Number of distinct (scope, gram) keys
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    /// Total number of occurrences
    pub fn occurrence_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// Check if the store holds no postings
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
