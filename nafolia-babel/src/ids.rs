//! Identifier bookkeeping
//!
//! [`IdRegistry`] maps source identifiers to whatever the target side built for them. It is
//! filled while the text and term layers are converted and consulted by every later layer.
//! [`TargetIds`] forms the identifiers of generated FoLiA nodes.

use crate::error::{ConversionError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct IdRegistry<T> {
    kind: &'static str,
    entries: HashMap<String, T>,
}

impl<T: PartialEq> IdRegistry<T> {
    /// An empty registry; `kind` names the identifiers in errors ("token", "term", ...)
    pub fn new(kind: &'static str) -> Self {
        IdRegistry {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Bind `id` to `target`. Registering the same binding again is a no-op, rebinding an id to
    /// a different target is an error.
    pub fn register(&mut self, id: impl Into<String>, target: T) -> Result<()> {
        let id = id.into();
        match self.entries.get(&id) {
            Some(existing) if *existing == target => Ok(()),
            Some(_) => Err(ConversionError::DuplicateIdentifier {
                kind: self.kind,
                id,
            }),
            None => {
                self.entries.insert(id, target);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, id: &str) -> Result<&T> {
        self.entries
            .get(id)
            .ok_or_else(|| ConversionError::UnknownIdentifier {
                kind: self.kind,
                id: id.to_string(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identifier scheme of generated FoLiA documents: everything is prefixed with the document id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIds {
    document: String,
}

impl TargetIds {
    pub fn new(document: impl Into<String>) -> Self {
        TargetIds {
            document: document.into(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// `<doc>.<local>`, for words and annotations carrying a source id
    pub fn local(&self, local: &str) -> String {
        format!("{}.{}", self.document, local)
    }

    pub fn text(&self) -> String {
        format!("{}.text", self.document)
    }

    pub fn paragraph(&self, para: &str) -> String {
        format!("{}.para{}", self.document, para)
    }

    pub fn sentence(&self, sent: &str) -> String {
        format!("{}.sent{}", self.document, sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent_for_same_target() {
        let mut registry = IdRegistry::new("token");
        registry.register("w1", 1).expect("first");
        registry.register("w1", 1).expect("same binding");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rebinding_is_a_duplicate() {
        let mut registry = IdRegistry::new("token");
        registry.register("w1", 1).expect("first");
        let err = registry.register("w1", 2).unwrap_err();
        assert!(matches!(err, ConversionError::DuplicateIdentifier { kind: "token", .. }));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry: IdRegistry<usize> = IdRegistry::new("term");
        let err = registry.resolve("t9").unwrap_err();
        assert_eq!(err.to_string(), "term identifier 't9' is not registered");
    }

    #[test]
    fn test_target_ids() {
        let ids = TargetIds::new("boeing");
        assert_eq!(ids.local("w1"), "boeing.w1");
        assert_eq!(ids.text(), "boeing.text");
        assert_eq!(ids.paragraph("1"), "boeing.para1");
        assert_eq!(ids.sentence("2"), "boeing.sent2");
    }
}
