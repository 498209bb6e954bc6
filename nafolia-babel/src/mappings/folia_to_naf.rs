//! FoLiA → NAF
//!
//! # The High-Level Concept
//!
//!     The nested FoLiA document is flattened into NAF layers. Every FoLiA word becomes one
//!     token `w<n>` and one term `t<n>`; all later layers refer to the words through those terms.
//!     Only dependencies, chunks and entities have a NAF counterpart, the remaining FoLiA layers
//!     are reported and dropped.
//!
//! # The Algorithm
//!
//!     1. Warn when the FoLiA version is missing or untested.
//!     2. Walk sentences in document order. Sentences are numbered from 0, paragraphs from 1.
//!        Tokens and terms are numbered together, so word `n` becomes `w<n>` spanned by `t<n>`.
//!     3. Offsets and the raw text are derived from the words and their `space` flags.
//!     4. Dependencies map head and dependent words to terms. Which terms head which others is
//!        remembered for step 5.
//!     5. Chunks pick their head: the only term of a one-term chunk, otherwise the first term
//!        that heads another term of the same chunk.
//!     6. Entities get one `references` block each. Annotations the reader dropped for
//!        referring to unknown words are reported here.
//!     7. The header gets the public id, the language and one `linguisticProcessors` block per
//!        NAF layer that received output.

use crate::conversion::{Conversion, ConversionOutput, FormatKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::ids::IdRegistry;
use crate::offsets::{derive_offsets, TokenLayout};
use crate::options::ConvertOptions;
use crate::provenance::ProvenanceLog;
use crate::stage::{Stage, StageTracker};
use nafolia_model::folia::{self, Document, LayerKind, ParagraphIdx, SpanKind, Word, WordIdx};
use nafolia_model::naf::{self, Chunk, Dependency, Entity, NafDocument, Public, Term, Token};
use std::collections::HashMap;

/// NAF version written into generated documents
pub const NAF_VERSION: &str = "v3";

/// The `folia2naf` conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct FoliaToNaf;

impl FoliaToNaf {
    pub fn new() -> Self {
        FoliaToNaf
    }

    pub fn convert_document(
        &self,
        folia: &Document,
        options: &ConvertOptions,
    ) -> Result<(NafDocument, Diagnostics)> {
        tracing::info!(
            document = %folia.id,
            words = folia.text.words.len(),
            "converting FoLiA to NAF"
        );
        let mut builder = Builder::new(folia, options);
        let mut stage = StageTracker::new();

        stage.require(Stage::Initialized)?;
        builder.check_version();
        builder.convert_text()?;
        stage.advance(Stage::TextConverted)?;

        builder.convert_terms()?;
        stage.advance(Stage::TermsConverted)?;

        let head_to_dependents = builder.convert_dependencies()?;
        builder.convert_chunks(&head_to_dependents)?;
        builder.convert_entities()?;
        builder.report_dangling();
        builder.report_unsupported();
        stage.advance(Stage::LayersConverted)?;

        builder.build_header();
        stage.advance(Stage::Finalized)?;

        Ok((builder.naf, builder.diagnostics))
    }
}

impl Conversion for FoliaToNaf {
    fn name(&self) -> &str {
        "folia2naf"
    }

    fn description(&self) -> &str {
        "FoLiA to NAF"
    }

    fn source(&self) -> FormatKind {
        FormatKind::Folia
    }

    fn target(&self) -> FormatKind {
        FormatKind::Naf
    }

    fn convert(&self, source: &str, options: &ConvertOptions) -> Result<ConversionOutput> {
        let doc = folia::parse_folia(source)?;
        let (naf, diagnostics) = self.convert_document(&doc, options)?;
        Ok(ConversionOutput {
            document: naf::write_naf(&naf),
            diagnostics,
        })
    }
}

/// Term ids a dependency head governs
pub type HeadToDependents = HashMap<String, Vec<String>>;

struct Builder<'a> {
    folia: &'a Document,
    options: &'a ConvertOptions,
    naf: NafDocument,
    /// FoLiA word id → NAF term id
    terms: IdRegistry<String>,
    provenance: ProvenanceLog,
    diagnostics: Diagnostics,
}

impl<'a> Builder<'a> {
    fn new(folia: &'a Document, options: &'a ConvertOptions) -> Self {
        Builder {
            folia,
            options,
            naf: NafDocument::new(),
            terms: IdRegistry::new("word"),
            provenance: ProvenanceLog::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn warn(&mut self, kind: DiagnosticKind, element: &str, message: impl Into<String>) {
        let context = self.folia.id.clone();
        self.diagnostics.report(kind, element, &context, message);
    }

    fn check_version(&mut self) {
        let folia = self.folia;
        match folia.version.as_deref() {
            None => self.warn(
                DiagnosticKind::UntestedVersion,
                "FoLiA",
                "FoLiA input does not state a version",
            ),
            Some(version) if !self.options.tested_versions.iter().any(|v| v == version) => {
                let message = format!(
                    "FoLiA version {version} has not been tested, the conversion may be incomplete"
                );
                self.warn(DiagnosticKind::UntestedVersion, "FoLiA", message)
            }
            Some(_) => {}
        }
    }

    /// Tokens with derived offsets, and the raw text
    fn convert_text(&mut self) -> Result<()> {
        let folia = self.folia;
        let body = &folia.text;
        let mut layouts: Vec<TokenLayout<'a, Option<ParagraphIdx>>> = Vec::new();
        let mut paragraph_number = 0usize;
        let mut last_paragraph: Option<ParagraphIdx> = None;

        for (sentence_number, (paragraph, sentence)) in
            body.sentences_in_order().into_iter().enumerate()
        {
            if paragraph.is_some() && paragraph != last_paragraph {
                paragraph_number += 1;
                last_paragraph = paragraph;
            }
            for &word_idx in &body.sentence(sentence).words {
                let word = body.word(word_idx);
                let n = self.naf.tokens.len() + 1;
                self.naf.tokens.push(Token {
                    id: format!("w{n}"),
                    sent: sentence_number.to_string(),
                    para: paragraph.map(|_| paragraph_number.to_string()),
                    offset: None,
                    length: None,
                    text: word.text.clone(),
                    malformed_position: None,
                });
                self.terms.register(word.id.as_str(), format!("t{n}"))?;
                self.provenance.record("text", &word.provenance);
                layouts.push(TokenLayout {
                    text: word.text.as_str(),
                    space: word.space,
                    paragraph,
                });
            }
        }

        let derived = derive_offsets(layouts);
        for (token, offset) in self.naf.tokens.iter_mut().zip(derived.offsets) {
            token.offset = Some(offset.offset);
            token.length = Some(offset.length);
        }
        self.naf.raw = Some(derived.raw);
        tracing::debug!(tokens = self.naf.tokens.len(), "text layer built");
        Ok(())
    }

    fn convert_terms(&mut self) -> Result<()> {
        let folia = self.folia;
        let body = &folia.text;
        let mut senses_reported = false;
        for (n, word_idx) in body.words_in_order().into_iter().enumerate() {
            let word = body.word(word_idx);
            let term_id = self.terms.resolve(&word.id)?.clone();
            let (pos, morphofeat) = pos_fields(word);
            let lemma = word.lemma();

            for annotation in word.pos_annotations() {
                self.provenance.record("terms", &annotation.provenance);
            }
            if let Some(lemma) = lemma {
                self.provenance.record("terms", &lemma.provenance);
            }
            if !senses_reported && word.senses().next().is_some() {
                self.warn(
                    DiagnosticKind::UnsupportedLayer,
                    &word.id,
                    "sense annotations can not be converted to NAF yet, skipping",
                );
                senses_reported = true;
            }

            self.naf.terms.push(Term {
                id: term_id,
                span: vec![format!("w{}", n + 1)],
                lemma: lemma.map(|lemma| lemma.class.clone()),
                pos,
                morphofeat,
                ..Term::default()
            });
        }
        Ok(())
    }

    fn term_of(&self, word: WordIdx) -> Result<String> {
        let id = &self.folia.text.word(word).id;
        Ok(self.terms.resolve(id)?.clone())
    }

    fn term_span(&self, words: &[WordIdx]) -> Result<Vec<String>> {
        words.iter().map(|word| self.term_of(*word)).collect()
    }

    /// First term of one side of a dependency, warning when there are several
    fn dependency_side(
        &mut self,
        words: &[WordIdx],
        side: &str,
        element: &str,
    ) -> Result<Option<String>> {
        let Some(first) = words.first() else {
            self.warn(
                DiagnosticKind::MissingSpan,
                element,
                format!("dependency has no {side}, skipping"),
            );
            return Ok(None);
        };
        if words.len() > 1 {
            self.warn(
                DiagnosticKind::MultiWordDependency,
                element,
                format!(
                    "dependency {side} consists of {} words, only the first is used",
                    words.len()
                ),
            );
        }
        self.term_of(*first).map(Some)
    }

    fn convert_dependencies(&mut self) -> Result<HeadToDependents> {
        let folia = self.folia;
        let mut head_to_dependents = HeadToDependents::new();
        for annotation in folia.text.annotations(LayerKind::Dependencies) {
            let SpanKind::Dependency { head, dependent } = &annotation.kind else {
                continue;
            };
            let element = annotation.id.as_deref().unwrap_or("dependency");
            let Some(from) = self.dependency_side(head, "head", element)? else {
                continue;
            };
            let Some(to) = self.dependency_side(dependent, "dependent", element)? else {
                continue;
            };
            self.provenance.record("deps", &annotation.provenance);
            head_to_dependents
                .entry(from.clone())
                .or_default()
                .push(to.clone());
            self.naf.dependencies.push(Dependency {
                from,
                to,
                function: annotation.class.clone(),
            });
        }
        Ok(head_to_dependents)
    }

    fn convert_chunks(&mut self, head_to_dependents: &HeadToDependents) -> Result<()> {
        let folia = self.folia;
        for annotation in folia.text.annotations(LayerKind::Chunking) {
            let id = format!("c{}", self.naf.chunks.len() + 1);
            let span = self.term_span(&annotation.words())?;
            if span.is_empty() {
                self.warn(DiagnosticKind::MissingSpan, &id, "chunk has no words, skipping");
                continue;
            }
            let head = identify_head(&span, head_to_dependents);
            if head.is_none() {
                let message = format!(
                    "no dependency identifies the head of chunk [{}]",
                    span.join(", ")
                );
                self.warn(DiagnosticKind::AmbiguousHead, &id, message);
            }
            self.provenance.record("chunks", &annotation.provenance);
            self.naf.chunks.push(Chunk {
                id,
                head,
                phrase: annotation.class.clone(),
                case: None,
                span,
            });
        }
        Ok(())
    }

    fn convert_entities(&mut self) -> Result<()> {
        let folia = self.folia;
        for annotation in folia.text.annotations(LayerKind::Entities) {
            let id = format!("e{}", self.naf.entities.len() + 1);
            let span = self.term_span(&annotation.words())?;
            if span.is_empty() {
                self.warn(DiagnosticKind::MissingSpan, &id, "entity has no words, skipping");
                continue;
            }
            self.provenance.record("entities", &annotation.provenance);
            self.naf.entities.push(Entity {
                id,
                entity_type: annotation.class.clone(),
                references: vec![span],
                external_refs: Vec::new(),
            });
        }
        Ok(())
    }

    fn report_dangling(&mut self) {
        let folia = self.folia;
        for dangling in &folia.dangling {
            let element = dangling.annotation.as_deref().unwrap_or(&dangling.element);
            self.warn(
                DiagnosticKind::DanglingSpanReference,
                element,
                format!(
                    "<{}> refers to unknown word '{}', skipping",
                    dangling.element, dangling.word
                ),
            );
        }
    }

    /// One warning per FoLiA layer kind or element that has no NAF counterpart here
    fn report_unsupported(&mut self) {
        let folia = self.folia;
        for (kind, title) in [
            (LayerKind::SemanticRoles, "Semantic roles"),
            (LayerKind::Sentiments, "Sentiments"),
            (LayerKind::Coreferences, "Coreference chains"),
        ] {
            if !folia.text.annotations(kind).is_empty() {
                self.warn(
                    DiagnosticKind::UnsupportedLayer,
                    kind.element_name(),
                    format!("{title} can not be converted to NAF yet, skipping"),
                );
            }
        }
        for element in &folia.unsupported {
            self.warn(
                DiagnosticKind::UnsupportedLayer,
                element,
                format!("FoLiA element '{element}' can not be converted to NAF, skipping"),
            );
        }
    }

    fn build_header(&mut self) {
        let folia = self.folia;
        self.naf.version = Some(NAF_VERSION.to_string());
        self.naf.lang = folia.language().map(str::to_string);
        self.naf.header.public = Some(Public {
            public_id: Some(folia.id.clone()),
            uri: folia.id.contains("http").then(|| folia.id.clone()),
        });
        self.provenance.apply(&mut self.naf, self.options);
    }
}

/// NAF `pos` and `morphofeat` of a word
///
/// Pos annotations in sets generated from NAF go back to the field they came from. Otherwise
/// the first pos annotation is a fine-grained tag: its class is the morphofeat and its head
/// feature the coarse pos.
fn pos_fields(word: &Word) -> (Option<String>, Option<String>) {
    let mut pos = None;
    let mut morphofeat = None;
    for annotation in word.pos_annotations() {
        let set = annotation.set.as_deref().unwrap_or_default();
        if set.contains("naf_pos") {
            pos.get_or_insert_with(|| annotation.class.clone());
        } else if set.contains("naf_morphofeat") {
            morphofeat.get_or_insert_with(|| annotation.class.clone());
        }
    }
    if pos.is_some() || morphofeat.is_some() {
        return (pos, morphofeat);
    }
    match word.pos_annotations().next() {
        Some(first) => (first.head.clone(), Some(first.class.clone())),
        None => (None, None),
    }
}

/// Syntactic head of a chunk's term span
pub fn identify_head(span: &[String], head_to_dependents: &HeadToDependents) -> Option<String> {
    if let [only] = span {
        return Some(only.clone());
    }
    span.iter()
        .find(|term| {
            head_to_dependents
                .get(term.as_str())
                .map_or(false, |deps| deps.iter().any(|dep| span.contains(dep)))
        })
        .cloned()
}
