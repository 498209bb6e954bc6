//! Token offsets against the raw text
//!
//! # The High-Level Concept
//!
//!     NAF positions every token in the raw text with an offset and a length. FoLiA usually does
//!     not: words only say whether a space follows them. Going from FoLiA to NAF the offsets (and
//!     the raw text itself) have to be derived; going the other way the stated offsets have to be
//!     checked before they are trusted.
//!
//!     Offsets and lengths count characters (Unicode scalar values), not bytes.
//!
//! # The Algorithm
//!
//!     Derive: walk the words in order keeping a running offset. Before each word except the
//!     first, emit a separator: `"\n\n"` when the word starts a new paragraph, otherwise a single
//!     space if the previous word was followed by one. The raw text is built from the very same
//!     separators, so every derived token selects exactly its own text from the raw text.
//!
//!     Validate: slice the raw text at each stated offset and compare with the token text. Out of
//!     bounds counts as a mismatch. A mismatching offset is dropped with a warning, the token
//!     itself is kept.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use nafolia_model::naf::Token;

/// One word as seen by [`derive_offsets`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLayout<'a, P> {
    pub text: &'a str,
    /// Followed by a space
    pub space: bool,
    /// Paragraph the word belongs to; a change emits a paragraph break
    pub paragraph: P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedOffset {
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedText {
    pub raw: String,
    pub offsets: Vec<DerivedOffset>,
}

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Derive offsets and raw text for words in document order
pub fn derive_offsets<'a, P: PartialEq + Copy>(
    tokens: impl IntoIterator<Item = TokenLayout<'a, P>>,
) -> DerivedText {
    let mut raw = String::new();
    let mut offsets = Vec::new();
    let mut cursor = 0usize;
    let mut previous: Option<TokenLayout<'a, P>> = None;

    for token in tokens {
        if let Some(prev) = previous {
            let separator = if prev.paragraph != token.paragraph {
                PARAGRAPH_SEPARATOR
            } else if prev.space {
                " "
            } else {
                ""
            };
            raw.push_str(separator);
            cursor += separator.chars().count();
        }
        let length = token.text.chars().count();
        offsets.push(DerivedOffset {
            offset: cursor,
            length,
        });
        raw.push_str(token.text);
        cursor += length;
        previous = Some(token);
    }

    DerivedText { raw, offsets }
}

/// Check stated token offsets against the raw text
///
/// Returns the offset to keep for each token: `Some` only when the token states an offset and a
/// length and the raw text at that position reads exactly the token text. A position that was
/// not a number is reported like a misaligned one. `context` names the document in warnings.
pub fn validate_offsets(
    raw: Option<&str>,
    tokens: &[Token],
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<Option<usize>> {
    let Some(raw) = raw else {
        if tokens.iter().any(|t| t.offset.is_some()) {
            diagnostics.report(
                DiagnosticKind::MissingRawText,
                "raw",
                context,
                "document has no raw text layer, discarding all token offsets",
            );
        }
        return vec![None; tokens.len()];
    };

    let chars: Vec<char> = raw.chars().collect();
    tokens
        .iter()
        .map(|token| {
            if let Some(position) = &token.malformed_position {
                diagnostics.report(
                    DiagnosticKind::OffsetMismatch,
                    &token.id,
                    context,
                    format!(
                        "position {position} of token '{}' is not a number, discarding offset",
                        token.text
                    ),
                );
                return None;
            }
            let (offset, length) = match (token.offset, token.length) {
                (Some(offset), Some(length)) => (offset, length),
                _ => return None,
            };
            let aligned = offset
                .checked_add(length)
                .and_then(|end| chars.get(offset..end))
                .map_or(false, |slice| slice.iter().copied().eq(token.text.chars()));
            if aligned {
                Some(offset)
            } else {
                diagnostics.report(
                    DiagnosticKind::OffsetMismatch,
                    &token.id,
                    context,
                    format!(
                        "offset {offset} (length {length}) of token '{}' does not align with the raw layer, discarding offset",
                        token.text
                    ),
                );
                None
            }
        })
        .collect()
}

/// Whether each token is followed by a space
///
/// A token is not followed by a space when its stated `offset + length` is exactly the stated
/// offset of the next token. Without stated offsets a space is assumed.
pub fn infer_spaces(tokens: &[Token]) -> Vec<bool> {
    let mut spaces = vec![true; tokens.len()];
    for (i, pair) in tokens.windows(2).enumerate() {
        if let (Some(offset), Some(length), Some(next)) =
            (pair[0].offset, pair[0].length, pair[1].offset)
        {
            if offset + length == next {
                spaces[i] = false;
            }
        }
    }
    spaces
}
