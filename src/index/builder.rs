//! Index builder
//!
//! Runs at document store/update time, inside the caller's write
//! transaction. Walks a document for configured scope elements, collects
//! each scope's logical text and emits one posting per gram. Re-indexing
//! a scope node first removes everything previously emitted for it:
//! replacement is exact, never a merge, so offsets can't go stale.

use crate::collect::{collect, Boundary};
use crate::config::IndexConfig;
use crate::dom::{DocId, NodeAccess, NodeRef};
use crate::error::{Error, Result};
use crate::index::ngram::grams;
use crate::index::postings::{Occurrence, PostingStore};
use crate::index::txn::Txn;

/// Builder for the n-gram postings of stored documents
pub struct IndexBuilder<'a> {
    config: &'a IndexConfig,
}

impl<'a> IndexBuilder<'a> {
    /// Create a builder over a collection's configuration
    pub fn new(config: &'a IndexConfig) -> Self {
        IndexBuilder { config }
    }

    /// Index every configured scope element under `root`.
    ///
    /// Returns the number of postings emitted.
    pub fn index_document<A: NodeAccess>(
        &self,
        access: &A,
        root: NodeRef,
        postings: &mut PostingStore,
        txn: &Txn,
    ) -> Result<usize> {
        if !txn.is_active() {
            return Err(Error::NoTransaction);
        }
        let mut emitted = 0;
        for scope in self.scopes_in_subtree(access, root) {
            emitted += self.index_scope(access, scope, postings);
        }
        log::debug!(
            "indexed document {} under txn {}: {} postings",
            root.doc,
            txn.id(),
            emitted
        );
        Ok(emitted)
    }

    /// Re-index after a structural change below `node`.
    ///
    /// Every scope element inside the subtree is rebuilt, and so is every
    /// enclosing scope, since its logical text covers the changed content.
    pub fn reindex_subtree<A: NodeAccess>(
        &self,
        access: &A,
        node: NodeRef,
        postings: &mut PostingStore,
        txn: &Txn,
    ) -> Result<usize> {
        if !txn.is_active() {
            return Err(Error::NoTransaction);
        }
        let mut scopes = self.scopes_in_subtree(access, node);
        let mut ancestor = access.parent(node);
        while let Some(a) = ancestor {
            if let Some(qname) = access.qname(a) {
                if self.config.is_scope(qname) {
                    scopes.push(a);
                }
            }
            ancestor = access.parent(a);
        }
        let mut emitted = 0;
        for scope in scopes {
            emitted += self.index_scope(access, scope, postings);
        }
        Ok(emitted)
    }

    /// Drop all postings pointing into a removed document
    pub fn remove_document(
        &self,
        doc: DocId,
        postings: &mut PostingStore,
        txn: &Txn,
    ) -> Result<()> {
        if !txn.is_active() {
            return Err(Error::NoTransaction);
        }
        postings.remove_document(doc);
        Ok(())
    }

    /// Configured scope elements in a subtree, document order
    fn scopes_in_subtree<A: NodeAccess>(&self, access: &A, root: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(qname) = access.qname(node) {
                if self.config.is_scope(qname) {
                    out.push(node);
                }
            }
            let mut children = access.children(node);
            children.reverse();
            stack.extend(children);
        }
        out.sort_unstable();
        out
    }

    /// Replace the postings of one scope node
    fn index_scope<A: NodeAccess>(
        &self,
        access: &A,
        scope: NodeRef,
        postings: &mut PostingStore,
    ) -> usize {
        let Some(qname) = access.qname(scope).cloned() else {
            return 0;
        };
        postings.remove_scope_node(&qname, scope);
        let logical = collect(access, scope, self.config, Boundary::None);
        let n = self.config.ngram().n;
        let mut emitted = 0;
        for gram in grams(&logical.text, n) {
            postings.insert(
                &qname,
                gram.text,
                Occurrence {
                    node: scope,
                    offset: gram.offset,
                },
            );
            emitted += 1;
        }
        emitted
    }
}
