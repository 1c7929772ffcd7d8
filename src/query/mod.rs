//! Query evaluation
//!
//! The phrase containment predicate over the n-gram index, plus the
//! match types handed to the serializer.

pub mod evaluate;
pub mod matches;

pub use evaluate::{evaluate_many, QueryContext};
pub use matches::{attribute_range, Match, MatchSet};
