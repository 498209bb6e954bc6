//! NAF → FoLiA on a complete document

use nafolia_babel::{
    ConversionError, ConversionRegistry, ConvertOptions, DiagnosticKind, FormatKind, SenseMode,
};
use nafolia_model::folia::{self, AnnotationType, Document, LayerKind, SpanKind, WordAnnotation};

const BOEING: &str = include_str!("fixtures/boeing.naf");

fn options() -> ConvertOptions {
    ConvertOptions::default().with_source_name("corpus/boeing.naf.xml")
}

fn convert(options: &ConvertOptions) -> (Document, nafolia_babel::Diagnostics) {
    let output = ConversionRegistry::with_defaults()
        .convert(BOEING, FormatKind::Naf, FormatKind::Folia, options)
        .expect("Boeing converts");
    let doc = folia::parse_folia(&output.document).expect("output is valid FoLiA");
    (doc, output.diagnostics)
}

#[test]
fn test_document_id_from_file_name() {
    let (doc, _) = convert(&options());
    assert_eq!(doc.id, "boeing");
    assert_eq!(doc.text.id, "boeing.text");
    assert_eq!(doc.text.words[0].id, "boeing.w1");
}

#[test]
fn test_diagnostics_are_collected_not_fatal() {
    let (_, diagnostics) = convert(&options());
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind.as_str()).collect();
    insta::assert_snapshot!(kinds.join(", "), @"dangling-span-reference, missing-span, unsupported-layer");
}

#[test]
fn test_offsets_survive() {
    let (doc, _) = convert(&options());
    let offsets: Vec<_> = doc.text.words.iter().map(|w| w.offset).collect();
    assert_eq!(offsets[..3], [Some(0), Some(7), Some(13)]);
}

#[test]
fn test_non_numeric_offset_keeps_token() {
    let source = BOEING.replace(r#"offset="7""#, r#"offset="seven""#);
    let output = ConversionRegistry::with_defaults()
        .convert(&source, FormatKind::Naf, FormatKind::Folia, &options())
        .expect("a bad offset is not fatal");
    assert_eq!(output.diagnostics.count(DiagnosticKind::OffsetMismatch), 1);
    let doc = folia::parse_folia(&output.document).expect("output is valid FoLiA");
    let offsets: Vec<_> = doc.text.words.iter().map(|w| w.offset).collect();
    assert_eq!(offsets[..3], [Some(0), None, Some(13)]);
    assert_eq!(doc.text.words[1].text, "loses");
}

#[test]
fn test_ranked_senses_in_output() {
    let (doc, _) = convert(&options());
    let loses = doc.text.word(doc.text.word_by_id("boeing.w2").expect("w2"));
    let primary: Vec<_> = loses.senses().map(|s| (s.class.as_str(), s.confidence)).collect();
    assert_eq!(primary, [("00000009", Some(0.9))]);
    match &loses.alternatives[..] {
        [alternative] => match &alternative[..] {
            [WordAnnotation::Sense(sense)] => assert_eq!(sense.confidence, Some(0.3)),
            other => panic!("expected one sense, got {other:?}"),
        },
        other => panic!("expected one alternative, got {other:?}"),
    }
}

#[test]
fn test_flat_senses_in_output() {
    let (doc, _) = convert(&options().with_sense_mode(SenseMode::Flat));
    let loses = doc.text.word(doc.text.word_by_id("boeing.w2").expect("w2"));
    assert_eq!(loses.senses().count(), 2);
    assert!(loses.alternatives.is_empty());
}

#[test]
fn test_span_layers() {
    let (doc, _) = convert(&options());
    let text = &doc.text;
    assert_eq!(text.annotations(LayerKind::Entities).len(), 1);
    assert_eq!(text.annotations(LayerKind::Chunking).len(), 2);
    assert_eq!(text.annotations(LayerKind::Dependencies).len(), 4);

    let predicates = text.annotations(LayerKind::SemanticRoles);
    match &predicates[0].kind {
        SpanKind::Predicate { roles } => assert_eq!(roles.len(), 2),
        other => panic!("expected a predicate, got {other:?}"),
    }

    let chains = text.annotations(LayerKind::Coreferences);
    assert_eq!(chains.len(), 1);

    let sentiments = text.annotations(LayerKind::Sentiments);
    assert_eq!(sentiments.len(), 1);
    match &sentiments[0].kind {
        SpanKind::Sentiment { source, target } => {
            assert_eq!(source.len(), 1);
            assert!(target.is_empty());
        }
        other => panic!("expected a sentiment, got {other:?}"),
    }
}

#[test]
fn test_declarations_carry_layer_tools() {
    let (doc, _) = convert(&options());
    let options = options();
    let pos = doc
        .declaration(AnnotationType::Pos, Some(options.set_url("pos").as_str()))
        .expect("pos declared");
    assert_eq!(pos.annotator.as_deref(), Some("tagger|wsd"));
    let entities = doc
        .declaration(AnnotationType::Entity, Some(options.set_url("entities").as_str()))
        .expect("entities declared");
    assert_eq!(entities.annotator.as_deref(), Some("ner"));
    assert!(!doc.is_declared(AnnotationType::Entity, &options.set_url("timex3")));
}

#[test]
fn test_invalid_document_id_is_fatal() {
    let err = ConversionRegistry::with_defaults()
        .convert(
            BOEING,
            FormatKind::Naf,
            FormatKind::Folia,
            &ConvertOptions::default().with_document_id("2016 news"),
        )
        .expect_err("id is not an NCName");
    assert!(matches!(err, ConversionError::InvalidDocumentId { .. }));
}

#[test]
fn test_missing_document_id_is_fatal() {
    let err = ConversionRegistry::with_defaults()
        .convert(BOEING, FormatKind::Naf, FormatKind::Folia, &ConvertOptions::default())
        .expect_err("nothing to derive an id from");
    assert!(matches!(err, ConversionError::MissingDocumentId));
}
