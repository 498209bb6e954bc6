//! Span resolution
//!
//! NAF layers point at text through spans: ordered lists of term ids, sometimes token ids. A
//! [`Span`] is the resolved form, an ordered non-empty list of FoLiA word handles.
//!
//! # The Algorithm
//!
//!     Each id is looked up as a term first (expanding to that term's words) and as a token
//!     second. Sources whose ids are token ids only (time expressions) skip the term lookup. An
//!     id that does not resolve makes the whole span dangling: one diagnostic is reported and the
//!     caller skips the item.
//!
//!     Sentence-scoped layers (entities, chunks, ...) are attached to the sentence of the span's
//!     first word. A span whose last word sits in another sentence can not be represented there
//!     and aborts the conversion. Text-scoped layers (coreference) skip that check.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ConversionError, Result};
use crate::ids::IdRegistry;
use nafolia_model::folia::{SentenceIdx, TextBody, WordIdx};
use nafolia_model::naf;

/// An ordered, non-empty sequence of words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    words: Vec<WordIdx>,
}

impl Span {
    /// `owner` names the element in the error for an empty span
    pub fn new(owner: &str, words: Vec<WordIdx>) -> Result<Span> {
        if words.is_empty() {
            return Err(ConversionError::EmptySpan(owner.to_string()));
        }
        Ok(Span { words })
    }

    /// Every word whose offset range lies within `start..end`
    ///
    /// Words without a (validated) offset never match.
    pub fn from_offsets(owner: &str, body: &TextBody, start: usize, end: usize) -> Result<Span> {
        let words = body
            .words_in_order()
            .into_iter()
            .filter(|idx| {
                let word = body.word(*idx);
                word.offset.map_or(false, |offset| {
                    offset >= start && offset + word.text.chars().count() <= end
                })
            })
            .collect();
        Span::new(owner, words)
    }

    pub fn words(&self) -> &[WordIdx] {
        &self.words
    }

    pub fn into_words(self) -> Vec<WordIdx> {
        self.words
    }

    pub fn first(&self) -> WordIdx {
        self.words[0]
    }

    pub fn last(&self) -> WordIdx {
        self.words[self.words.len() - 1]
    }

    /// Sentence of the first word
    pub fn sentence(&self, body: &TextBody) -> SentenceIdx {
        body.word(self.first()).sentence
    }
}

/// What the ids of a span name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTargets {
    /// Term ids, falling back to token ids
    TermsOrTokens,
    Tokens,
}

/// Anything that refers to text through a list of term or token ids
pub trait SpanSource {
    /// Id of the owning element, for diagnostics
    fn source_id(&self) -> &str;

    fn span_ids(&self) -> &[String];

    fn targets(&self) -> SpanTargets {
        SpanTargets::TermsOrTokens
    }
}

/// An ad-hoc span owned by some element, e.g. one `references` block of an entity
#[derive(Debug, Clone, Copy)]
pub struct SpanRef<'a> {
    pub owner: &'a str,
    pub ids: &'a [String],
}

impl SpanSource for SpanRef<'_> {
    fn source_id(&self) -> &str {
        self.owner
    }

    fn span_ids(&self) -> &[String] {
        self.ids
    }
}

macro_rules! span_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SpanSource for $ty {
                fn source_id(&self) -> &str {
                    &self.id
                }

                fn span_ids(&self) -> &[String] {
                    &self.span
                }
            }
        )*
    };
}

span_source!(
    naf::Term,
    naf::Markable,
    naf::Chunk,
    naf::Predicate,
    naf::Role,
);

impl SpanSource for naf::TimeExpression {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn span_ids(&self) -> &[String] {
        &self.span
    }

    fn targets(&self) -> SpanTargets {
        SpanTargets::Tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanScope {
    /// Must stay within one sentence
    Sentence,
    /// May cross sentences
    Text,
}

/// What spans resolve against
pub struct SpanResolver<'a> {
    pub terms: &'a IdRegistry<Vec<WordIdx>>,
    pub tokens: &'a IdRegistry<WordIdx>,
    pub body: &'a TextBody,
}

impl SpanResolver<'_> {
    /// Resolve `source` to a span
    ///
    /// `Ok(None)` when an id dangles (reported once in `diagnostics`); `context` names the
    /// document or sentence in that report.
    pub fn resolve(
        &self,
        source: &dyn SpanSource,
        scope: SpanScope,
        context: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Span>> {
        let targets = source.targets();
        let mut words = Vec::new();
        for id in source.span_ids() {
            let term_words = match targets {
                SpanTargets::TermsOrTokens => self.terms.resolve(id).ok(),
                SpanTargets::Tokens => None,
            };
            if let Some(term_words) = term_words {
                words.extend(term_words.iter().copied());
            } else if let Ok(word) = self.tokens.resolve(id) {
                words.push(*word);
            } else {
                let expected = match targets {
                    SpanTargets::TermsOrTokens => "neither a term nor a token",
                    SpanTargets::Tokens => "no token",
                };
                diagnostics.report(
                    DiagnosticKind::DanglingSpanReference,
                    source.source_id(),
                    context,
                    format!(
                        "span target '{id}' resolves to {expected}, skipping '{}'",
                        source.source_id()
                    ),
                );
                return Ok(None);
            }
        }

        let span = Span::new(source.source_id(), words)?;
        if scope == SpanScope::Sentence {
            let first = span.sentence(self.body);
            let last = self.body.word(span.last()).sentence;
            if first != last {
                return Err(ConversionError::CrossSentenceSpan {
                    element: source.source_id().to_string(),
                    first: self.body.sentence(first).id.clone(),
                    last: self.body.sentence(last).id.clone(),
                });
            }
        }
        Ok(Some(span))
    }
}
