//! Document identifiers
//!
//! A FoLiA document needs an id. It is either given explicitly or derived from the input file
//! name (everything before the first `.`), and in both cases checked against an [`IdPolicy`].

use crate::error::{ConversionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Decides whether a string may be used as a document id
pub trait IdPolicy: Send + Sync {
    /// `Err` carries a short reason
    fn validate(&self, id: &str) -> std::result::Result<(), String>;
}

/// XML NCName: a name without colons, as required for `xml:id`
#[derive(Debug, Clone, Copy, Default)]
pub struct NcNamePolicy;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{M}\p{N}_.\-\x{B7}]*$").expect("NCName pattern is valid")
});

impl IdPolicy for NcNamePolicy {
    fn validate(&self, id: &str) -> std::result::Result<(), String> {
        if NCNAME.is_match(id) {
            Ok(())
        } else {
            Err("not an XML NCName".to_string())
        }
    }
}

/// The file name of `source_name` up to its first `.`
pub fn derive_document_id(source_name: &str) -> Option<String> {
    let file_name = Path::new(source_name).file_name()?.to_str()?;
    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Pick the explicit id if there is one, otherwise derive it, then validate
pub fn resolve_document_id(
    explicit: Option<&str>,
    source_name: Option<&str>,
    policy: &dyn IdPolicy,
) -> Result<String> {
    let id = match explicit.filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => source_name
            .and_then(derive_document_id)
            .ok_or(ConversionError::MissingDocumentId)?,
    };
    policy
        .validate(&id)
        .map_err(|reason| ConversionError::InvalidDocumentId {
            id: id.clone(),
            reason,
        })?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("corpus/boeing.naf.xml", Some("boeing"))]
    #[case("boeing.naf", Some("boeing"))]
    #[case("/tmp/wsj_0001", Some("wsj_0001"))]
    #[case(".hidden", None)]
    fn test_derive_document_id(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(derive_document_id(name).as_deref(), expected);
    }

    #[rstest]
    #[case("boeing", true)]
    #[case("_x.1-a", true)]
    #[case("1984", false)]
    #[case("a:b", false)]
    #[case("with space", false)]
    fn test_ncname_policy(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(NcNamePolicy.validate(id).is_ok(), valid);
    }

    #[test]
    fn test_explicit_id_wins() {
        let id = resolve_document_id(Some("doc"), Some("other.naf"), &NcNamePolicy);
        assert_eq!(id.expect("valid"), "doc");
    }

    #[test]
    fn test_invalid_derived_id() {
        let err = resolve_document_id(None, Some("2016-report.naf"), &NcNamePolicy).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidDocumentId { .. }));
    }

    #[test]
    fn test_missing_id() {
        let err = resolve_document_id(None, None, &NcNamePolicy).unwrap_err();
        assert!(matches!(err, ConversionError::MissingDocumentId));
    }
}
