//! NAF to FoLiA
//!
//! # The High-Level Concept
//!
//!     NAF is a stack of flat layers that point at each other by identifier. FoLiA is a tree
//!     whose leaves (words) carry their own annotations and whose sentences own annotation
//!     layers. Converting means rebuilding the tree from the token layer, then walking every
//!     other NAF layer and hanging each item into the right FoLiA container.
//!
//! # The Algorithm
//!
//!     1. Resolve the document id and copy the header metadata.
//!     2. Text: every token becomes a word. Paragraphs and sentences are created as tokens
//!        reveal them. Offsets are checked against the raw layer, spaces inferred from offsets.
//!        Token ids are registered.
//!     3. Terms: term ids are registered against their words. Single-word terms put pos,
//!        morphofeat, lemma and senses on their word.
//!     4. Layers, in a fixed order: entities, markables, chunks, coreference, semantic roles,
//!        dependencies, time expressions, unsupported-layer notices, opinions. Every item is
//!        resolved through the span resolver and attached to a layer found through the
//!        container cache. Items that can not be resolved are skipped with a diagnostic.
//!     5. Tools named in the NAF header become the annotators of the matching declarations.
//!
//!     Steps 2 to 5 are guarded by the stage tracker; layer converters only run once terms are
//!     in place.

mod layers;
mod terms;
mod text;

use crate::containers::{ContainerCache, StructureBuilder};
use crate::conversion::{Conversion, ConversionOutput, FormatKind};
use crate::diagnostics::Diagnostics;
use crate::docid::{resolve_document_id, IdPolicy, NcNamePolicy};
use crate::error::Result;
use crate::exref::{resolve_alignments, ResolvedReferences};
use crate::ids::{IdRegistry, TargetIds};
use crate::options::ConvertOptions;
use crate::span::{Span, SpanResolver, SpanScope, SpanSource};
use crate::stage::{Stage, StageTracker};
use nafolia_model::folia::{
    self, AnnotationType, Document, LayerKind, LayerParent, SpanAnnotation, WordIdx,
};
use nafolia_model::naf::{self, ExternalRefId, NafDocument};

/// Everything a layer converter reads from and writes to during one run
pub struct Context<'a> {
    pub naf: &'a NafDocument,
    pub options: &'a ConvertOptions,
    pub doc: Document,
    pub ids: TargetIds,
    pub tokens: IdRegistry<WordIdx>,
    pub terms: IdRegistry<Vec<WordIdx>>,
    pub containers: ContainerCache,
    pub structure: StructureBuilder,
    pub diagnostics: Diagnostics,
}

impl<'a> Context<'a> {
    pub fn new(naf: &'a NafDocument, options: &'a ConvertOptions, document_id: String) -> Self {
        Context {
            naf,
            options,
            doc: Document::new(document_id.as_str()),
            ids: TargetIds::new(document_id),
            tokens: IdRegistry::new("token"),
            terms: IdRegistry::new("term"),
            containers: ContainerCache::new(),
            structure: StructureBuilder::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn document_id(&self) -> &str {
        self.ids.document()
    }

    pub fn resolve(&mut self, source: &dyn SpanSource, scope: SpanScope) -> Result<Option<Span>> {
        let resolver = SpanResolver {
            terms: &self.terms,
            tokens: &self.tokens,
            body: &self.doc.text,
        };
        resolver.resolve(source, scope, self.ids.document(), &mut self.diagnostics)
    }

    /// Declare `annotation_type` with the set called `name`, returning the set URL
    pub fn declare(&mut self, annotation_type: AnnotationType, name: &str) -> String {
        let set = self.options.set_url(name);
        if self.doc.declare(annotation_type, set.as_str()) {
            tracing::debug!(set = %set, "declared {}", annotation_type.declaration_element());
        }
        set
    }

    /// Append an annotation to the layer for `(parent, kind, set)`, creating the layer if needed
    pub fn attach(
        &mut self,
        parent: LayerParent,
        kind: LayerKind,
        set: &str,
        annotation: SpanAnnotation,
    ) {
        let layer = self
            .containers
            .get_or_create(&mut self.doc.text, parent, kind, set);
        self.doc.text.layer_mut(layer).annotations.push(annotation);
    }

    /// Alignments and features for the external references of `element`
    pub fn references(&mut self, refs: &[ExternalRefId], element: &str) -> ResolvedReferences {
        let naf = self.naf;
        let resolved = resolve_alignments(
            &naf.external_refs,
            refs,
            element,
            self.ids.document(),
            &mut self.diagnostics,
        );
        if !resolved.alignments.is_empty() {
            self.declare(AnnotationType::Alignment, "alignments");
        }
        resolved
    }
}

/// One step of the conversion
pub trait LayerConverter {
    fn name(&self) -> &'static str;

    /// Only structural problems are returned; skipped items go to `ctx.diagnostics`
    fn convert(&self, ctx: &mut Context<'_>) -> Result<()>;
}

/// The `naf2folia` conversion
pub struct NafToFolia {
    id_policy: Box<dyn IdPolicy>,
}

impl NafToFolia {
    pub fn new() -> Self {
        Self::with_id_policy(NcNamePolicy)
    }

    pub fn with_id_policy<P: IdPolicy + 'static>(policy: P) -> Self {
        NafToFolia {
            id_policy: Box::new(policy),
        }
    }

    pub fn convert_document(
        &self,
        naf: &NafDocument,
        options: &ConvertOptions,
    ) -> Result<(Document, Diagnostics)> {
        let id = resolve_document_id(
            options.document_id.as_deref(),
            options.source_name.as_deref(),
            self.id_policy.as_ref(),
        )?;
        tracing::info!(document = %id, tokens = naf.tokens.len(), "converting NAF to FoLiA");

        let mut ctx = Context::new(naf, options, id);
        let mut stage = StageTracker::new();
        copy_metadata(&mut ctx);

        stage.require(Stage::Initialized)?;
        text::TextConverter.convert(&mut ctx)?;
        stage.advance(Stage::TextConverted)?;

        terms::TermsConverter.convert(&mut ctx)?;
        stage.advance(Stage::TermsConverted)?;

        for converter in layers::converters() {
            tracing::debug!(layer = converter.name(), "converting layer");
            converter.convert(&mut ctx)?;
        }
        stage.advance(Stage::LayersConverted)?;

        annotate_declarations(&mut ctx);
        stage.advance(Stage::Finalized)?;

        Ok((ctx.doc, ctx.diagnostics))
    }
}

impl Default for NafToFolia {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversion for NafToFolia {
    fn name(&self) -> &str {
        "naf2folia"
    }

    fn description(&self) -> &str {
        "NAF to FoLiA"
    }

    fn source(&self) -> FormatKind {
        FormatKind::Naf
    }

    fn target(&self) -> FormatKind {
        FormatKind::Folia
    }

    fn convert(&self, source: &str, options: &ConvertOptions) -> Result<ConversionOutput> {
        let naf = naf::parse_naf(source)?;
        let (doc, diagnostics) = self.convert_document(&naf, options)?;
        Ok(ConversionOutput {
            document: folia::write_folia(&doc),
            diagnostics,
        })
    }
}

fn copy_metadata(ctx: &mut Context<'_>) {
    let naf = ctx.naf;
    let metadata = &mut ctx.doc.metadata;
    if let Some(lang) = &naf.lang {
        metadata.insert("language".to_string(), lang.clone());
    }
    if let Some(public) = &naf.header.public {
        if let Some(public_id) = &public.public_id {
            metadata.insert("publicId".to_string(), public_id.clone());
        }
        if let Some(uri) = &public.uri {
            metadata.insert("source".to_string(), uri.clone());
        }
    }
    if let Some(file_desc) = &naf.header.file_desc {
        for (key, value) in file_desc.fields() {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
}

/// NAF layer name, the declaration type it feeds, and the set name when the type is shared
const LAYER_DECLARATIONS: [(&str, AnnotationType, Option<&str>); 15] = [
    ("text", AnnotationType::Token, None),
    ("text", AnnotationType::Sentence, None),
    ("text", AnnotationType::Paragraph, None),
    ("terms", AnnotationType::Pos, None),
    ("terms", AnnotationType::Lemma, None),
    ("terms", AnnotationType::Sense, None),
    ("entities", AnnotationType::Entity, Some("entities")),
    ("markables", AnnotationType::Entity, Some("markables")),
    ("timeExpressions", AnnotationType::Entity, Some("timex3")),
    ("chunks", AnnotationType::Chunking, None),
    ("coreferences", AnnotationType::Coreference, None),
    ("srl", AnnotationType::SemanticRole, None),
    ("srl", AnnotationType::Predicate, None),
    ("deps", AnnotationType::Dependency, None),
    ("opinions", AnnotationType::Sentiment, None),
];

/// Name the tools of each NAF layer as annotator of the declarations that layer produced
///
/// A layer may list several processors; their names are joined with `|`. The datetime is the
/// first processor's timestamp.
fn annotate_declarations(ctx: &mut Context<'_>) {
    let naf = ctx.naf;
    for (layer, annotation_type, set_name) in LAYER_DECLARATIONS {
        let processors = naf.processors(layer);
        if processors.is_empty() {
            continue;
        }
        let annotator = processors
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join("|");
        let datetime = processors
            .first()
            .and_then(|p| p.timestamp.clone().or_else(|| p.begin_timestamp.clone()));
        let set = set_name.map(|name| ctx.options.set_url(name));

        for declaration in ctx.doc.declarations.iter_mut() {
            let matches = declaration.annotation_type == annotation_type
                && set.as_deref().map_or(true, |set| declaration.set == set);
            if matches && declaration.annotator.is_none() {
                declaration.annotator = Some(annotator.clone());
                declaration.datetime = datetime.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::error::ConversionError;
    use nafolia_model::folia::{SpanKind, WordAnnotation};

    const BOEING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NAF xml:lang="en" version="v3">
  <nafHeader>
    <fileDesc title="Boeing news" author="Reuters"/>
    <public publicId="boeing" uri="http://example.org/boeing"/>
    <linguisticProcessors layer="text">
      <lp name="tokenizer" version="1.0" timestamp="2016-01-01T10:00:00Z"/>
    </linguisticProcessors>
    <linguisticProcessors layer="terms">
      <lp name="tagger" version="1.0" timestamp="2016-01-01T10:00:01Z"/>
      <lp name="wsd" version="2.0" timestamp="2016-01-01T10:00:02Z"/>
    </linguisticProcessors>
  </nafHeader>
  <raw>Boeing loses contract. It appeals.</raw>
  <text>
    <wf id="w1" sent="1" para="1" offset="0" length="6">Boeing</wf>
    <wf id="w2" sent="1" para="1" offset="7" length="5">loses</wf>
    <wf id="w3" sent="1" para="1" offset="13" length="8">contract</wf>
    <wf id="w4" sent="1" para="1" offset="21" length="1">.</wf>
    <wf id="w5" sent="2" para="1" offset="23" length="2">It</wf>
    <wf id="w6" sent="2" para="1" offset="26" length="7">appeals</wf>
    <wf id="w7" sent="2" para="1" offset="33" length="1">.</wf>
  </text>
  <terms>
    <term id="t1" type="open" lemma="Boeing" pos="N" morphofeat="NNP"><span><target id="w1"/></span></term>
    <term id="t2" type="open" lemma="lose" pos="V" morphofeat="VBZ">
      <span><target id="w2"/></span>
      <externalReferences>
        <externalRef resource="WordNet-3.0" reference="eng-30-00000003-v" confidence="0.3"/>
        <externalRef resource="WordNet-3.0" reference="eng-30-00000009-v" confidence="0.9"/>
      </externalReferences>
    </term>
    <term id="t3" type="open" lemma="contract" pos="N" morphofeat="NN"><span><target id="w3"/></span></term>
    <term id="t4" type="close" lemma="." pos="O" morphofeat="."><span><target id="w4"/></span></term>
    <term id="t5" type="close" lemma="it" pos="Q" morphofeat="PRP"><span><target id="w5"/></span></term>
    <term id="t6" type="open" lemma="appeal" pos="V" morphofeat="VBZ"><span><target id="w6"/></span></term>
    <term id="t7" type="close" lemma="." pos="O" morphofeat="."><span><target id="w7"/></span></term>
  </terms>
  <entities>
    <entity id="e1" type="ORGANIZATION">
      <references><span><target id="t1"/></span></references>
      <externalReferences>
        <externalRef resource="spotlight" reference="http://dbpedia.org/resource/Boeing"/>
      </externalReferences>
    </entity>
    <entity id="e2" type="MISC">
      <references><span><target id="t99"/></span></references>
    </entity>
  </entities>
  <deps>
    <dep from="t2" to="t1" rfunc="nsubj"/>
    <dep from="t2" to="t3" rfunc="dobj"/>
  </deps>
  <coreferences>
    <coref id="co1" type="entity">
      <span><target id="t1"/></span>
      <span><target id="t5"/></span>
    </coref>
  </coreferences>
  <timeExpressions>
    <timex3 id="tx1" type="DATE" value="2016-01-01" functionInDocument="CREATION_TIME"/>
  </timeExpressions>
  <temporalRelations/>
</NAF>"#;

    fn convert(source: &str, options: &ConvertOptions) -> Result<(Document, Diagnostics)> {
        let naf = naf::parse_naf(source)?;
        NafToFolia::new().convert_document(&naf, options)
    }

    fn boeing() -> (Document, Diagnostics) {
        let options = ConvertOptions::default().with_document_id("boeing");
        convert(BOEING, &options).expect("converts")
    }

    #[test]
    fn test_words_and_structure() {
        let (doc, _) = boeing();
        let words: Vec<_> = doc.text.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["Boeing", "loses", "contract", ".", "It", "appeals", "."]);
        assert_eq!(doc.text.paragraphs.len(), 1);
        assert_eq!(doc.text.sentences.len(), 2);
        assert_eq!(doc.text.sentences[1].id, "boeing.sent2");
        assert_eq!(doc.text.words[0].id, "boeing.w1");
        assert_eq!(doc.text.words[2].offset, Some(13));
        assert!(!doc.text.words[2].space);
    }

    #[test]
    fn test_metadata_is_copied() {
        let (doc, _) = boeing();
        assert_eq!(doc.language(), Some("en"));
        assert_eq!(doc.metadata["publicId"], "boeing");
        assert_eq!(doc.metadata["source"], "http://example.org/boeing");
        assert_eq!(doc.metadata["title"], "Boeing news");
    }

    #[test]
    fn test_ranked_senses() {
        let (doc, _) = boeing();
        let loses = &doc.text.words[1];
        let senses: Vec<_> = loses.senses().map(|s| s.class.as_str()).collect();
        assert_eq!(senses, ["00000009"]);
        assert_eq!(loses.alternatives.len(), 1);
        match &loses.alternatives[0][0] {
            WordAnnotation::Sense(sense) => assert_eq!(sense.confidence, Some(0.3)),
            other => panic!("expected a sense, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_entity_is_skipped() {
        let (doc, diagnostics) = boeing();
        let entities = doc.text.annotations(LayerKind::Entities);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id.as_deref(), Some("boeing.e1"));
        assert_eq!(entities[0].alignments[0].format.as_deref(), Some("text/html"));
        assert_eq!(diagnostics.count(DiagnosticKind::DanglingSpanReference), 1);
    }

    #[test]
    fn test_coreference_is_text_level() {
        let (doc, _) = boeing();
        assert_eq!(doc.text.text_layers.len(), 1);
        let chains = doc.text.annotations(LayerKind::Coreferences);
        match &chains[0].kind {
            SpanKind::CoreferenceChain { links } => assert_eq!(links.len(), 2),
            other => panic!("expected a chain, got {other:?}"),
        }
    }

    #[test]
    fn test_spanless_timex_and_unsupported_layers_are_reported() {
        let (doc, diagnostics) = boeing();
        assert_eq!(diagnostics.count(DiagnosticKind::MissingSpan), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::UnsupportedLayer), 1);
        assert!(!doc.is_declared(
            AnnotationType::Entity,
            &ConvertOptions::default().set_url("timex3")
        ));
    }

    #[test]
    fn test_declarations_carry_annotators() {
        let (doc, _) = boeing();
        let options = ConvertOptions::default();
        let pos = doc
            .declaration(AnnotationType::Pos, Some(&options.set_url("pos")))
            .expect("declared");
        assert_eq!(pos.annotator.as_deref(), Some("tagger|wsd"));
        assert_eq!(pos.datetime.as_deref(), Some("2016-01-01T10:00:01Z"));
        let token = doc.declaration(AnnotationType::Token, None).expect("declared");
        assert_eq!(token.annotator.as_deref(), Some("tokenizer"));
        let entity = doc
            .declaration(AnnotationType::Entity, Some(&options.set_url("entities")))
            .expect("declared");
        assert_eq!(entity.annotator, None);
    }

    #[test]
    fn test_id_is_derived_from_source_name() {
        let options = ConvertOptions::default().with_source_name("corpus/wsj_0001.naf.xml");
        let (doc, _) = convert(BOEING, &options).expect("converts");
        assert_eq!(doc.id, "wsj_0001");
    }

    #[test]
    fn test_invalid_derived_id_is_fatal() {
        let options = ConvertOptions::default().with_source_name("2016.naf");
        let err = convert(BOEING, &options).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidDocumentId { .. }));
    }

    #[test]
    fn test_multiple_references_is_fatal() {
        let source = BOEING.replace(
            r#"<references><span><target id="t1"/></span></references>"#,
            r#"<references><span><target id="t1"/></span></references><references><span><target id="t3"/></span></references>"#,
        );
        let options = ConvertOptions::default().with_document_id("boeing");
        let err = convert(&source, &options).unwrap_err();
        assert!(matches!(err, ConversionError::MultipleReferences { count: 2, .. }));
    }

    #[test]
    fn test_serialized_output_is_folia() {
        let options = ConvertOptions::default().with_document_id("boeing");
        let output = NafToFolia::new().convert(BOEING, &options).expect("converts");
        assert!(output.document.contains(r#"<FoLiA xmlns="http://ilk.uvt.nl/folia""#));
        assert!(output.document.contains(r#"xml:id="boeing""#));
    }
}
