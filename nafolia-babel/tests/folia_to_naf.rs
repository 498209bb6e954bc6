//! FoLiA → NAF on a complete document

use nafolia_babel::{ConversionRegistry, ConvertOptions, DiagnosticKind, FormatKind};
use nafolia_model::naf::{self, NafDocument};

const BOEING: &str = include_str!("fixtures/boeing.folia.xml");

fn convert() -> (NafDocument, nafolia_babel::Diagnostics) {
    convert_source(BOEING)
}

fn convert_source(source: &str) -> (NafDocument, nafolia_babel::Diagnostics) {
    let options = ConvertOptions::default().with_timestamp("2024-05-01T12:00:00Z");
    let output = ConversionRegistry::with_defaults()
        .convert(source, FormatKind::Folia, FormatKind::Naf, &options)
        .expect("Boeing converts");
    let doc = naf::parse_naf(&output.document).expect("output is valid NAF");
    (doc, output.diagnostics)
}

#[test]
fn test_raw_text_and_offsets() {
    let (doc, _) = convert();
    insta::assert_snapshot!(doc.raw.clone().unwrap_or_default().replace('\n', "¶"), @"Boeing loses contract.¶¶It appeals.");
    let offsets: Vec<_> = doc.tokens.iter().filter_map(|t| t.offset).collect();
    assert_eq!(offsets, [0, 7, 13, 21, 24, 27, 34]);
    assert_eq!(doc.tokens[4].sent, "1");
    assert_eq!(doc.tokens[4].para.as_deref(), Some("2"));
}

#[test]
fn test_terms() {
    let (doc, _) = convert();
    let loses = doc.term("t2").expect("t2");
    assert_eq!(loses.span, ["w2"]);
    assert_eq!(loses.pos.as_deref(), Some("V"));
    assert_eq!(loses.morphofeat.as_deref(), Some("VBZ"));
    assert_eq!(loses.lemma.as_deref(), Some("lose"));
    assert_eq!(doc.term("t4").and_then(|t| t.lemma.clone()), None);
}

#[test]
fn test_layers() {
    let (doc, diagnostics) = convert();
    let deps: Vec<_> = doc
        .dependencies
        .iter()
        .map(|d| format!("{}->{}", d.from, d.to))
        .collect();
    assert_eq!(deps, ["t2->t1", "t2->t3"]);
    let heads: Vec<_> = doc.chunks.iter().map(|c| c.head.as_deref()).collect();
    assert_eq!(heads, [Some("t1"), Some("t2")]);
    assert_eq!(doc.entities[0].entity_type.as_deref(), Some("ORG"));
    assert_eq!(diagnostics.count(DiagnosticKind::AmbiguousHead), 0);
    assert_eq!(diagnostics.count(DiagnosticKind::UnsupportedLayer), 1);
}

#[test]
fn test_entity_with_unknown_word_is_skipped() {
    let source = BOEING.replace(
        "</entity>\n",
        "</entity>\n          <entity xml:id=\"boeing.e2\" class=\"LOC\"><wref id=\"boeing.w99\"/></entity>\n",
    );
    let (doc, diagnostics) = convert_source(&source);
    assert_eq!(diagnostics.count(DiagnosticKind::DanglingSpanReference), 1);
    let types: Vec<_> = doc.entities.iter().map(|e| e.entity_type.as_deref()).collect();
    assert_eq!(types, [Some("ORG")]);
    assert_eq!(doc.tokens.len(), 7);
}

#[test]
fn test_header_lists_tools_per_layer() {
    let (doc, _) = convert();
    let layers: Vec<_> = doc
        .header
        .processors
        .iter()
        .map(|lps| lps.layer.as_str())
        .collect();
    assert_eq!(layers, ["text", "terms", "deps", "chunks", "entities"]);

    let names = |layer: &str| -> Vec<String> {
        doc.processors(layer).iter().map(|p| p.name.clone()).collect()
    };
    assert_eq!(names("text"), ["nafolia", "ucto"]);
    assert_eq!(names("terms"), ["nafolia", "frog"]);
    assert_eq!(names("chunks"), ["nafolia"]);

    let alpino = &doc.processors("deps")[1];
    assert_eq!(alpino.timestamp.as_deref(), Some("2017-03-01T10:05:00"));
    assert_eq!(doc.processors("entities")[1].end_timestamp.as_deref(), Some("unknown"));
    assert_eq!(doc.processors("text")[0].timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
}

#[test]
fn test_public_and_language() {
    let (doc, _) = convert();
    assert_eq!(doc.lang.as_deref(), Some("en"));
    assert_eq!(doc.version.as_deref(), Some("v3"));
    let public = doc.header.public.expect("public");
    assert_eq!(public.public_id.as_deref(), Some("boeing"));
    assert_eq!(public.uri, None);
}
