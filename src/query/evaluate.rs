//! Phrase containment evaluation
//!
//! Implements the substring/phrase predicate over the n-gram index. The
//! index is a coarse sieve: gram co-occurrence narrows the search to
//! candidate offsets, and every candidate is then verified
//! character-for-character against the scope's re-collected logical
//! text. Evaluation is read-only; any number of evaluations may run
//! concurrently against the same store.

use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;
use rayon::prelude::*;

use crate::collect::{collect, Boundary, LogicalText};
use crate::config::{IndexConfig, QName};
use crate::dom::{NodeAccess, NodeRef};
use crate::index::ngram::grams;
use crate::index::postings::PostingStore;
use crate::query::matches::{attribute_range, Match, MatchSet};

/// Logical texts kept per evaluation call
const TEXT_CACHE_CAPACITY: usize = 64;

/// Evaluation context for one predicate call
pub struct QueryContext<'a, A: NodeAccess> {
    access: &'a A,
    config: &'a IndexConfig,
    postings: &'a PostingStore,
    /// Re-collected logical texts, keyed by scope node
    cache: LruCache<NodeRef, Rc<LogicalText>>,
}

impl<'a, A: NodeAccess> QueryContext<'a, A> {
    /// Create a context over a store, configuration and posting store
    pub fn new(access: &'a A, config: &'a IndexConfig, postings: &'a PostingStore) -> Self {
        QueryContext {
            access,
            config,
            postings,
            cache: LruCache::new(
                NonZeroUsize::new(TEXT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    /// Evaluate the phrase containment predicate over a candidate set.
    ///
    /// Empty phrase or empty candidates short-circuit to an empty result.
    /// A candidate without an enclosing configured scope, or one that is
    /// not a persisted node, is silently excluded.
    pub fn evaluate(&mut self, candidates: &[NodeRef], phrase: &str) -> MatchSet {
        let mut out = MatchSet::new();
        if phrase.is_empty() || candidates.is_empty() {
            return out;
        }
        let n = self.config.ngram().n;
        let phrase_len = phrase.chars().count();

        for &candidate in candidates {
            if self.access.node(candidate).is_none() {
                continue;
            }
            let Some((scope_node, scope_qname)) = self.nearest_scope(candidate) else {
                continue;
            };
            let starts = self.candidate_starts(&scope_qname, scope_node, phrase, phrase_len, n);
            if starts.is_empty() {
                continue;
            }
            let logical = self.logical_text(scope_node);
            for start in starts {
                if !logical.verify(start, phrase) {
                    // gram co-occurrence without the literal phrase
                    continue;
                }
                let spans = attribute_range(&logical, start, start + phrase_len);
                if spans.is_empty() {
                    continue;
                }
                if !spans
                    .iter()
                    .all(|s| self.access.is_ancestor_or_self(candidate, s.node))
                {
                    // occurrence lies partly outside the candidate's subtree
                    continue;
                }
                out.insert(Match {
                    owner: candidate,
                    text: phrase.to_string(),
                    spans,
                });
            }
        }
        log::debug!("phrase '{}': {} match(es)", phrase, out.len());
        out
    }

    /// Boolean predicate for a single item
    pub fn contains(&mut self, node: NodeRef, phrase: &str) -> bool {
        !self.evaluate(std::slice::from_ref(&node), phrase).is_empty()
    }

    /// Predicate surface for filter expressions: one flag per candidate,
    /// with the verified matches folded into `matches` for the serializer
    pub fn scoped_text_contains(
        &mut self,
        candidates: &[NodeRef],
        phrase: &str,
        matches: &mut MatchSet,
    ) -> Vec<bool> {
        let result = self.evaluate(candidates, phrase);
        let flags = candidates
            .iter()
            .map(|c| result.matches_for(*c).next().is_some())
            .collect();
        matches.merge(result);
        flags
    }

    /// Nearest ancestor-or-self element configured as an index scope
    fn nearest_scope(&self, node: NodeRef) -> Option<(NodeRef, QName)> {
        let mut current = Some(node);
        while let Some(c) = current {
            if let Some(qname) = self.access.qname(c) {
                if self.config.is_scope(qname) {
                    return Some((c, qname.clone()));
                }
            }
            current = self.access.parent(c);
        }
        None
    }

    /// Candidate starting offsets of the phrase in one scope node's
    /// logical text, from postings alone
    fn candidate_starts(
        &self,
        scope_qname: &QName,
        scope_node: NodeRef,
        phrase: &str,
        phrase_len: usize,
        n: usize,
    ) -> Vec<usize> {
        if phrase_len >= n {
            // Consecutive phrase grams must sit at consecutive offsets
            let phrase_grams = grams(phrase, n);
            let mut iter = phrase_grams.iter();
            let Some(first) = iter.next() else {
                return Vec::new();
            };
            let mut starts: Vec<usize> = self
                .postings
                .lookup(scope_qname, first.text)
                .iter()
                .filter(|occ| occ.node == scope_node)
                .map(|occ| occ.offset)
                .collect();
            for gram in iter {
                if starts.is_empty() {
                    break;
                }
                let offsets: HashSet<usize> = self
                    .postings
                    .lookup(scope_qname, gram.text)
                    .iter()
                    .filter(|occ| occ.node == scope_node)
                    .map(|occ| occ.offset)
                    .collect();
                starts.retain(|s| offsets.contains(&(s + gram.offset)));
            }
            starts
        } else {
            // Phrase shorter than a gram: scan the scope's ordered key
            // range and locate the phrase inside each gram
            let mut starts = BTreeSet::new();
            for (gram, occurrences) in self.postings.scan_prefix(scope_qname, "") {
                for (byte_pos, _) in gram.match_indices(phrase) {
                    let char_pos = gram[..byte_pos].chars().count();
                    for occ in occurrences.iter().filter(|occ| occ.node == scope_node) {
                        starts.insert(occ.offset + char_pos);
                    }
                }
            }
            starts.into_iter().collect()
        }
    }

    /// Re-collect (or reuse) a scope's logical text
    fn logical_text(&mut self, scope: NodeRef) -> Rc<LogicalText> {
        if let Some(found) = self.cache.get(&scope) {
            return Rc::clone(found);
        }
        let logical = Rc::new(collect(self.access, scope, self.config, Boundary::None));
        self.cache.put(scope, Rc::clone(&logical));
        logical
    }
}

/// Evaluate several phrases against the same candidate set in parallel.
///
/// Each phrase gets its own context; evaluation only reads persisted
/// content, so the fan-out is safe.
pub fn evaluate_many<A: NodeAccess + Sync>(
    access: &A,
    config: &IndexConfig,
    postings: &PostingStore,
    candidates: &[NodeRef],
    phrases: &[&str],
) -> Vec<MatchSet> {
    phrases
        .par_iter()
        .map(|phrase| {
            let mut ctx = QueryContext::new(access, config, postings);
            ctx.evaluate(candidates, phrase)
        })
        .collect()
}
