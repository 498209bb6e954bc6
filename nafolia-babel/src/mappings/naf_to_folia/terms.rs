//! Terms → pos, lemma and sense annotations on words
//!
//! Every term is registered against its words so later layers can resolve spans of term ids.
//! Only terms covering exactly one token carry annotations over; FoLiA has no place for a pos
//! tag spanning several words.

use super::{Context, LayerConverter};
use crate::diagnostics::DiagnosticKind;
use crate::error::Result;
use crate::exref::{collect_senses, group_senses, place_senses, SenseCandidate};
use crate::span::Span;
use nafolia_model::folia::{
    AnnotationType, LemmaAnnotation, PosAnnotation, SenseAnnotation, WordAnnotation, WordIdx,
};
use nafolia_model::naf::Term;

pub struct TermsConverter;

impl LayerConverter for TermsConverter {
    fn name(&self) -> &'static str {
        "terms"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        let mut sentiment_reported = false;

        for term in &naf.terms {
            let Some(words) = term_words(ctx, term) else {
                continue;
            };
            let span = Span::new(&term.id, words)?;
            ctx.terms.register(term.id.as_str(), span.words().to_vec())?;

            if term.has_sentiment && !sentiment_reported {
                let context = ctx.document_id().to_string();
                ctx.diagnostics.report(
                    DiagnosticKind::UnsupportedLayer,
                    &term.id,
                    &context,
                    "term level Sentiment can not be converted to FoLiA, skipping",
                );
                sentiment_reported = true;
            }

            if let [word] = span.words() {
                annotate_word(ctx, term, *word);
            } else {
                let context = ctx.document_id().to_string();
                ctx.diagnostics.report(
                    DiagnosticKind::MultiTokenTerm,
                    &term.id,
                    &context,
                    format!(
                        "term spans {} tokens, its annotations are not converted",
                        span.words().len()
                    ),
                );
            }
        }
        tracing::debug!(terms = ctx.terms.len(), "terms converted");
        Ok(())
    }
}

/// Words of the tokens a term spans; `None` (reported) when one of them is unknown
fn term_words(ctx: &mut Context<'_>, term: &Term) -> Option<Vec<WordIdx>> {
    let mut words = Vec::with_capacity(term.span.len());
    for id in &term.span {
        match ctx.tokens.resolve(id) {
            Ok(word) => words.push(*word),
            Err(_) => {
                let context = ctx.document_id().to_string();
                ctx.diagnostics.report(
                    DiagnosticKind::DanglingSpanReference,
                    &term.id,
                    &context,
                    format!("term refers to unknown token '{id}', skipping the term"),
                );
                return None;
            }
        }
    }
    Some(words)
}

fn annotate_word(ctx: &mut Context<'_>, term: &Term, word: WordIdx) {
    let mut annotations = Vec::new();
    let mut alternatives = Vec::new();

    if let Some(pos) = non_empty(&term.pos) {
        let set = ctx.declare(AnnotationType::Pos, "pos");
        annotations.push(WordAnnotation::Pos(PosAnnotation {
            set: Some(set),
            class: pos.to_string(),
            ..PosAnnotation::default()
        }));
    }
    if let Some(morphofeat) = non_empty(&term.morphofeat) {
        let set = ctx.declare(AnnotationType::Pos, "morphofeat");
        annotations.push(WordAnnotation::Pos(PosAnnotation {
            set: Some(set),
            class: morphofeat.to_string(),
            ..PosAnnotation::default()
        }));
    }
    if let Some(lemma) = non_empty(&term.lemma) {
        let set = ctx.declare(AnnotationType::Lemma, "lemma");
        annotations.push(WordAnnotation::Lemma(LemmaAnnotation {
            set: Some(set),
            class: lemma.to_string(),
            ..LemmaAnnotation::default()
        }));
    }

    let naf = ctx.naf;
    let context = ctx.document_id().to_string();
    let candidates = collect_senses(
        &naf.external_refs,
        &term.external_refs,
        &term.id,
        &context,
        &mut ctx.diagnostics,
    );
    for group in group_senses(candidates) {
        let set = ctx.declare(
            AnnotationType::Sense,
            &format!("sense_{}", group.resource.replace(' ', "_")),
        );
        let placement = place_senses(group, ctx.options.sense_mode);
        annotations.extend(
            placement
                .primary
                .into_iter()
                .map(|sense| sense_annotation(&set, sense)),
        );
        alternatives.extend(
            placement
                .alternatives
                .into_iter()
                .map(|sense| vec![sense_annotation(&set, sense)]),
        );
    }

    let word = ctx.doc.text.word_mut(word);
    word.annotations.extend(annotations);
    word.alternatives.extend(alternatives);
}

fn sense_annotation(set: &str, sense: SenseCandidate) -> WordAnnotation {
    WordAnnotation::Sense(SenseAnnotation {
        set: Some(set.to_string()),
        class: sense.class,
        confidence: sense.confidence,
        features: sense.features,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
