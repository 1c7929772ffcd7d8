//! N-gram index
//!
//! Build-time side of the engine: gram decomposition, the logical
//! posting store, and the builder that fills it under a write
//! transaction.

pub mod builder;
pub mod ngram;
pub mod postings;
pub mod txn;

pub use builder::IndexBuilder;
pub use ngram::{grams, Gram};
pub use postings::{Occurrence, PostingKey, PostingStore};
pub use txn::Txn;
