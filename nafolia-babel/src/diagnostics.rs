//! Per-item problems found during a conversion
//!
//! Converters never abort on a single bad item. They push a [`Diagnostic`] naming the element and
//! where it lives, skip the item and carry on. Every push is mirrored as a `tracing` warning, so a
//! caller that only installs a subscriber still sees them; the collected list is returned with
//! the converted document for callers that want to inspect or serialize it.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A layer (or annotation) present in the source that has no counterpart in the target
    UnsupportedLayer,
    /// A span target that is neither a known term nor a known token
    DanglingSpanReference,
    /// A term over more than one token; POS, lemma and senses are not attached
    MultiTokenTerm,
    /// A token whose offset and length do not select its text from the raw layer
    OffsetMismatch,
    /// Tokens state offsets but there is no raw layer to check them against
    MissingRawText,
    /// A confidence outside [0, 1], clamped
    ConfidenceOutOfRange,
    /// A confidence that is not a number, dropped
    MalformedConfidence,
    /// A sense reference that does not follow the resource's identifier convention
    MalformedResourceIdentifier,
    /// An external reference to a resource with no conversion rule
    UnknownResource,
    /// An item without the span it needs (span-less time expression, entity without references)
    MissingSpan,
    /// A chunk whose head term can not be identified
    AmbiguousHead,
    /// A dependency whose head or dependent covers more than one word
    MultiWordDependency,
    /// The input declares a format version the converter was not tested against
    UntestedVersion,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedLayer => "unsupported-layer",
            DiagnosticKind::DanglingSpanReference => "dangling-span-reference",
            DiagnosticKind::MultiTokenTerm => "multi-token-term",
            DiagnosticKind::OffsetMismatch => "offset-mismatch",
            DiagnosticKind::MissingRawText => "missing-raw-text",
            DiagnosticKind::ConfidenceOutOfRange => "confidence-out-of-range",
            DiagnosticKind::MalformedConfidence => "malformed-confidence",
            DiagnosticKind::MalformedResourceIdentifier => "malformed-resource-identifier",
            DiagnosticKind::UnknownResource => "unknown-resource",
            DiagnosticKind::MissingSpan => "missing-span",
            DiagnosticKind::AmbiguousHead => "ambiguous-head",
            DiagnosticKind::MultiWordDependency => "multi-word-dependency",
            DiagnosticKind::UntestedVersion => "untested-version",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Id of the offending element
    pub element: Option<String>,
    /// Id of the sentence or document containing it
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            element: None,
            context: None,
        }
    }

    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        match (&self.element, &self.context) {
            (Some(element), Some(context)) => write!(f, " (element '{element}' in '{context}')"),
            (Some(element), None) => write!(f, " (element '{element}')"),
            (None, Some(context)) => write!(f, " (in '{context}')"),
            (None, None) => Ok(()),
        }
    }
}

/// Append-only collection of diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            element = diagnostic.element.as_deref().unwrap_or(""),
            context = diagnostic.context.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    /// Shorthand for the common case of an element inside a context
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        element: &str,
        context: &str,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(kind, message).element(element).context(context));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_element_and_context() {
        let diagnostic = Diagnostic::new(DiagnosticKind::OffsetMismatch, "offset does not align")
            .element("w3")
            .context("doc.sent1");
        insta::assert_snapshot!(
            diagnostic.to_string(),
            @"[offset-mismatch] offset does not align (element 'w3' in 'doc.sent1')"
        );
    }

    #[test]
    fn test_count_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticKind::MultiTokenTerm, "t1", "doc", "spans two tokens");
        diagnostics.report(DiagnosticKind::MultiTokenTerm, "t2", "doc", "spans two tokens");
        diagnostics.push(Diagnostic::new(DiagnosticKind::UntestedVersion, "no version"));
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count(DiagnosticKind::MultiTokenTerm), 2);
    }

    #[test]
    fn test_json_uses_snake_case_kinds() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticKind::AmbiguousHead, "c1", "doc", "no head");
        let json = diagnostics.to_json().expect("serializable");
        assert!(json.contains("\"kind\": \"ambiguous_head\""));
        assert!(json.contains("\"element\": \"c1\""));
    }
}
