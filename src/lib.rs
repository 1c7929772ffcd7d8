//! textgram - Full-text n-gram indexing and match highlighting for XML
//!
//! The engine answers one question - does the text of an element (or of
//! content scoped by a named descendant) contain a given phrase? - and
//! can re-render the document with every verified occurrence wrapped in
//! non-destructive marker elements, even when the matched characters
//! span nested elements and mixed content.
//!
//! Pipeline:
//! - `config`: which element names own an n-gram index
//! - `collect`: flattened descendant text with a map back to text nodes
//! - `index`: gram postings emitted at store time under a transaction
//! - `query`: phrase sieve over postings, verified character-for-character
//! - `serialize`: highlight markers injected by chainable filters
//!
//! The storage engine, transaction manager and query language are
//! external collaborators; they appear here only as the handles and
//! traits the engine consumes (`NodeRef`, `NodeAccess`, `Txn`).

pub mod collect;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod serialize;

pub use collect::{collect, Boundary, LogicalText, TextSpan};
pub use config::{IndexConfig, IndexKind, NgramOptions, QName};
pub use dom::{DocId, DocStore, NodeAccess, NodeId, NodeKind, NodeRef};
pub use engine::Engine;
pub use error::{Error, Result};
pub use index::{grams, IndexBuilder, Occurrence, PostingStore, Txn};
pub use query::{attribute_range, evaluate_many, Match, MatchSet, QueryContext};
pub use serialize::{
    Event, HighlightMatches, MatchFilter, MatchListener, Serializer, MATCH_NAME, MATCH_NS,
    MATCH_PREFIX,
};
