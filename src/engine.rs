//! Engine facade
//!
//! Wires the document store, the collection configuration and the
//! posting store together behind one surface: transactional document
//! store/update, the phrase predicate, and serialization with optional
//! highlighting. Thin by design; every piece is usable on its own.

use crate::config::IndexConfig;
use crate::dom::{DocId, DocStore, NodeRef};
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, PostingStore, Txn};
use crate::query::{evaluate_many, MatchSet, QueryContext};
use crate::serialize::{HighlightMatches, Serializer};

/// Full-text index engine over one collection
pub struct Engine {
    config: IndexConfig,
    store: DocStore,
    postings: PostingStore,
    next_txn: u64,
}

impl Engine {
    /// Create an engine over a loaded configuration
    pub fn new(config: IndexConfig) -> Self {
        Engine {
            config,
            store: DocStore::new(),
            postings: PostingStore::new(),
            next_txn: 0,
        }
    }

    /// Begin a write transaction
    pub fn begin(&mut self) -> Txn {
        self.next_txn += 1;
        Txn::new(self.next_txn)
    }

    /// Parse, store and index a document
    pub fn store_document(&mut self, txn: &Txn, xml: &str) -> Result<DocId> {
        if !txn.is_active() {
            return Err(Error::NoTransaction);
        }
        let id = self.store.insert(xml)?;
        let root = self
            .store
            .root(id)
            .ok_or_else(|| Error::storage("stored document has no root"))?;
        let builder = IndexBuilder::new(&self.config);
        builder.index_document(&self.store, root, &mut self.postings, txn)?;
        Ok(id)
    }

    /// Remove a document and every posting pointing into it
    pub fn remove_document(&mut self, txn: &Txn, doc: DocId) -> Result<()> {
        if !txn.is_active() {
            return Err(Error::NoTransaction);
        }
        self.store.remove(doc)?;
        self.postings.remove_document(doc);
        Ok(())
    }

    /// Rebuild all postings of a stored document
    pub fn reindex_document(&mut self, txn: &Txn, doc: DocId) -> Result<usize> {
        let root = self.store.root(doc).ok_or(Error::UnknownDocument(doc))?;
        let builder = IndexBuilder::new(&self.config);
        builder.index_document(&self.store, root, &mut self.postings, txn)
    }

    /// Rebuild the postings affected by a change below `node`
    pub fn reindex_subtree(&mut self, txn: &Txn, node: NodeRef) -> Result<usize> {
        let builder = IndexBuilder::new(&self.config);
        builder.reindex_subtree(&self.store, node, &mut self.postings, txn)
    }

    /// Evaluate the phrase predicate over a candidate set
    pub fn evaluate(&self, candidates: &[NodeRef], phrase: &str) -> MatchSet {
        QueryContext::new(&self.store, &self.config, &self.postings).evaluate(candidates, phrase)
    }

    /// Evaluate several phrases in parallel
    pub fn evaluate_many(&self, candidates: &[NodeRef], phrases: &[&str]) -> Vec<MatchSet> {
        evaluate_many(&self.store, &self.config, &self.postings, candidates, phrases)
    }

    /// Predicate surface for filter expressions: a flag per candidate,
    /// verified matches folded into `matches` for later serialization
    pub fn scoped_text_contains(
        &self,
        candidates: &[NodeRef],
        phrase: &str,
        matches: &mut MatchSet,
    ) -> Vec<bool> {
        QueryContext::new(&self.store, &self.config, &self.postings).scoped_text_contains(
            candidates,
            phrase,
            matches,
        )
    }

    /// Serialize a node's subtree, rendering matches per the output option
    pub fn serialize(
        &self,
        node: NodeRef,
        matches: &MatchSet,
        highlight: HighlightMatches,
    ) -> Result<String> {
        Serializer::with_matches(&self.store, matches, highlight).serialize(node)
    }

    /// The document store
    pub fn store(&self) -> &DocStore {
        &self.store
    }

    /// The collection configuration
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The posting store
    pub fn postings(&self) -> &PostingStore {
        &self.postings
    }

    /// Root element of a stored document
    pub fn root(&self, doc: DocId) -> Option<NodeRef> {
        self.store.root(doc)
    }

    /// Descendant-or-self elements by local name, in document order
    pub fn elements_by_name(&self, doc: DocId, local: &str) -> Vec<NodeRef> {
        self.store.elements_by_name(doc, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexKind, NgramOptions, QName};

    fn engine_with(scopes: &[&str]) -> Engine {
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        for s in scopes {
            config.declare(QName::local(*s), IndexKind::Ngram).unwrap();
        }
        Engine::new(config)
    }

    #[test]
    fn test_store_query_serialize() {
        let mut engine = engine_with(&["para"]);
        let mut txn = engine.begin();
        let doc = engine
            .store_document(&txn, "<para>hello world</para>")
            .unwrap();
        txn.commit();

        let para = engine.root(doc).unwrap();
        let matches = engine.evaluate(&[para], "world");
        assert_eq!(matches.len(), 1);
        let out = engine
            .serialize(para, &matches, HighlightMatches::Elements)
            .unwrap();
        assert!(out.contains("world</tg:match>"));
    }

    #[test]
    fn test_store_outside_txn_fails() {
        let mut engine = engine_with(&["para"]);
        let mut txn = engine.begin();
        txn.abort();
        assert!(matches!(
            engine.store_document(&txn, "<para>x</para>"),
            Err(Error::NoTransaction)
        ));
    }

    #[test]
    fn test_remove_document_drops_postings() {
        let mut engine = engine_with(&["para"]);
        let txn = engine.begin();
        let doc = engine.store_document(&txn, "<para>abcdef</para>").unwrap();
        assert!(!engine.postings().is_empty());
        engine.remove_document(&txn, doc).unwrap();
        assert!(engine.postings().is_empty());
    }
}
