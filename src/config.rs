//! Index configuration
//!
//! Per-collection declaration of which qualified element names own an
//! n-gram index, plus the collection-wide default policy for elements
//! without an explicit declaration. Loaded once per collection and
//! read-only afterwards; replaced wholesale on reconfiguration.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Default n-gram length when none is configured
pub const DEFAULT_NGRAM_LEN: usize = 3;

/// A qualified element name: optional namespace URI plus local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    ns: Option<String>,
    local: String,
}

impl QName {
    /// Create a name in a namespace
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        QName {
            ns: Some(ns.into()),
            local: local.into(),
        }
    }

    /// Create a name with no namespace
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            ns: None,
            local: local.into(),
        }
    }

    /// Local part of the name
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Namespace URI, if any
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Kind of index owned by an element name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// N-gram index over the element's descendant text
    Ngram,
    /// No index
    None,
}

/// N-gram scheme parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramOptions {
    /// Gram length in characters
    pub n: usize,
}

impl Default for NgramOptions {
    fn default() -> Self {
        NgramOptions {
            n: DEFAULT_NGRAM_LEN,
        }
    }
}

/// Immutable per-collection index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Explicitly declared scopes
    scopes: HashMap<QName, IndexKind>,
    /// Policy for element names without a declaration
    default_kind: IndexKind,
    /// N-gram scheme shared by build and query
    ngram: NgramOptions,
}

impl IndexConfig {
    /// Create an empty configuration with the given default policy.
    ///
    /// A gram length of zero is meaningless and clamped to one.
    pub fn new(default_kind: IndexKind, ngram: NgramOptions) -> Self {
        IndexConfig {
            scopes: HashMap::new(),
            default_kind,
            ngram: NgramOptions { n: ngram.n.max(1) },
        }
    }

    /// Load a configuration from a list of declarations.
    ///
    /// Invalid or conflicting declarations are rejected individually and
    /// returned as errors; the remaining rules stay active.
    pub fn load(
        default_kind: IndexKind,
        ngram: NgramOptions,
        decls: impl IntoIterator<Item = (QName, IndexKind)>,
    ) -> (Self, Vec<Error>) {
        let mut config = Self::new(default_kind, ngram);
        let mut errors = Vec::new();
        for (qname, kind) in decls {
            if let Err(e) = config.declare(qname, kind) {
                log::warn!("index declaration rejected: {}", e);
                errors.push(e);
            }
        }
        (config, errors)
    }

    /// Add a single declaration; rejects malformed names and conflicts
    pub fn declare(&mut self, qname: QName, kind: IndexKind) -> Result<()> {
        validate_qname(&qname)?;
        match self.scopes.get(&qname) {
            Some(existing) if *existing != kind => Err(Error::config(format!(
                "conflicting index kind for {}: {:?} vs {:?}",
                qname, existing, kind
            ))),
            _ => {
                self.scopes.insert(qname, kind);
                Ok(())
            }
        }
    }

    /// Index kind for an element name, falling back to the default policy
    pub fn kind_for(&self, qname: &QName) -> IndexKind {
        self.scopes
            .get(qname)
            .copied()
            .unwrap_or(self.default_kind)
    }

    /// Check whether an element name owns an n-gram index
    #[inline]
    pub fn is_scope(&self, qname: &QName) -> bool {
        self.kind_for(qname) == IndexKind::Ngram
    }

    /// N-gram scheme parameters
    #[inline]
    pub fn ngram(&self) -> NgramOptions {
        self.ngram
    }

    /// Number of explicit declarations
    pub fn declaration_count(&self) -> usize {
        self.scopes.len()
    }
}

/// Check that a declared name is a plausible element name
fn validate_qname(qname: &QName) -> Result<()> {
    let local = qname.local_name();
    if local.is_empty() {
        return Err(Error::config("empty local name"));
    }
    let mut chars = local.chars();
    let first = chars.next().unwrap_or(' ');
    if first.is_ascii_digit() || first == '-' || first == '.' {
        return Err(Error::config(format!("invalid name start in '{}'", local)));
    }
    if local
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ':' | '<' | '>' | '&' | '/' | '"' | '\''))
    {
        return Err(Error::config(format!("invalid character in '{}'", local)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        assert!(!config.is_scope(&QName::local("para")));

        let config = IndexConfig::new(IndexKind::Ngram, NgramOptions::default());
        assert!(config.is_scope(&QName::local("para")));
    }

    #[test]
    fn test_declared_scope_overrides_default() {
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        config.declare(QName::local("para"), IndexKind::Ngram).unwrap();
        assert!(config.is_scope(&QName::local("para")));
        assert!(!config.is_scope(&QName::local("note")));
    }

    #[test]
    fn test_conflicting_declaration_rejected() {
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        config.declare(QName::local("para"), IndexKind::Ngram).unwrap();
        let err = config.declare(QName::local("para"), IndexKind::None);
        assert!(err.is_err());
        // The original rule stays active
        assert!(config.is_scope(&QName::local("para")));
    }

    #[test]
    fn test_duplicate_same_kind_is_idempotent() {
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        config.declare(QName::local("para"), IndexKind::Ngram).unwrap();
        config.declare(QName::local("para"), IndexKind::Ngram).unwrap();
        assert_eq!(config.declaration_count(), 1);
    }

    #[test]
    fn test_invalid_name_rejected_others_active() {
        let (config, errors) = IndexConfig::load(
            IndexKind::None,
            NgramOptions::default(),
            vec![
                (QName::local(""), IndexKind::Ngram),
                (QName::local("para"), IndexKind::Ngram),
                (QName::local("bad name"), IndexKind::Ngram),
            ],
        );
        assert_eq!(errors.len(), 2);
        assert!(config.is_scope(&QName::local("para")));
    }

    #[test]
    fn test_namespaced_names_distinct() {
        let mut config = IndexConfig::new(IndexKind::None, NgramOptions::default());
        config
            .declare(QName::new("urn:a", "para"), IndexKind::Ngram)
            .unwrap();
        assert!(config.is_scope(&QName::new("urn:a", "para")));
        assert!(!config.is_scope(&QName::local("para")));
    }
}
