//! Conversion trait definition
//!
//! A [`Conversion`] turns a serialized document of one format into a serialized document of
//! another, returning the per-item problems it ran into alongside the result. Conversions are
//! collected in the [`ConversionRegistry`](crate::registry::ConversionRegistry).

use crate::diagnostics::Diagnostics;
use crate::error::{ConversionError, Result};
use crate::options::ConvertOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// The document formats nafolia reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Naf,
    Folia,
}

static FIRST_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[A-Za-z_][\w.\-]*:)?([A-Za-z_][\w.\-]*)[\s/>]")
        .expect("start tag pattern is valid")
});

impl FormatKind {
    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::Naf => "naf",
            FormatKind::Folia => "folia",
        }
    }

    /// Guess the format from the root element
    ///
    /// The XML declaration, comments and doctype are skipped because none of them start with a
    /// name character.
    pub fn detect(source: &str) -> Result<FormatKind> {
        let root = FIRST_ELEMENT
            .captures(source)
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str());
        match root {
            Some("NAF") => Ok(FormatKind::Naf),
            Some("FoLiA") => Ok(FormatKind::Folia),
            _ => Err(ConversionError::UnknownFormat),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "naf" => Ok(FormatKind::Naf),
            "folia" => Ok(FormatKind::Folia),
            other => Err(format!("unknown format '{other}', expected 'naf' or 'folia'")),
        }
    }
}

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    /// The serialized target document
    pub document: String,
    /// Everything that was skipped or repaired on the way
    pub diagnostics: Diagnostics,
}

/// Trait for conversions between document formats
///
/// # Examples
///
/// ```ignore
/// struct Identity;
///
/// impl Conversion for Identity {
///     fn name(&self) -> &str {
///         "naf2naf"
///     }
///
///     fn source(&self) -> FormatKind {
///         FormatKind::Naf
///     }
///
///     fn target(&self) -> FormatKind {
///         FormatKind::Naf
///     }
///
///     fn convert(&self, source: &str, _options: &ConvertOptions) -> Result<ConversionOutput> {
///         Ok(ConversionOutput {
///             document: source.to_string(),
///             diagnostics: Diagnostics::new(),
///         })
///     }
/// }
/// ```
pub trait Conversion: Send + Sync {
    /// The name of this conversion (e.g. "naf2folia")
    fn name(&self) -> &str;

    /// Optional description of this conversion
    fn description(&self) -> &str {
        ""
    }

    fn source(&self) -> FormatKind;

    fn target(&self) -> FormatKind;

    /// Convert a serialized source document
    ///
    /// Per-item problems are collected in the output's diagnostics; only structural problems
    /// and unreadable input are errors.
    fn convert(&self, source: &str, options: &ConvertOptions) -> Result<ConversionOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"<?xml version="1.0" encoding="UTF-8"?><NAF xml:lang="en">"#, FormatKind::Naf)]
    #[case("<!-- generated --><NAF>", FormatKind::Naf)]
    #[case(r#"<FoLiA xmlns="http://ilk.uvt.nl/folia" xml:id="d">"#, FormatKind::Folia)]
    #[case(r#"<folia:FoLiA xmlns:folia="http://ilk.uvt.nl/folia">"#, FormatKind::Folia)]
    fn test_detect(#[case] source: &str, #[case] expected: FormatKind) {
        assert_eq!(FormatKind::detect(source).expect("detected"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("plain text")]
    #[case("<html><body/></html>")]
    fn test_detect_unknown(#[case] source: &str) {
        assert!(matches!(FormatKind::detect(source), Err(ConversionError::UnknownFormat)));
    }

    #[test]
    fn test_format_kind_names() {
        assert_eq!("FoLiA".parse::<FormatKind>(), Ok(FormatKind::Folia));
        assert_eq!(FormatKind::Naf.to_string(), "naf");
        assert!("kaf".parse::<FormatKind>().is_err());
    }
}
