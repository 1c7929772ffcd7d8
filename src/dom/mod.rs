//! Document model
//!
//! Arena-based storage for persisted XML documents:
//! - NodeId (u32) indices for cache-friendly traversal
//! - NodeRef (document + node) as the stable handle held by the engine
//! - `NodeAccess` trait as the seam to the storage layer

pub mod document;
pub mod node;

pub use document::{DocStore, Document, NodeAccess};
pub use node::{Attribute, DocId, Node, NodeId, NodeKind, NodeRef};
