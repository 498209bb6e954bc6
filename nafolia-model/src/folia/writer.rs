//! FoLiA writer

use super::*;
use crate::xml::{to_document_string, Element};

/// Serialize a FoLiA document to an XML string
pub fn write_folia(doc: &Document) -> String {
    to_document_string(&folia_to_element(doc))
}

/// Build the element tree of a FoLiA document
pub fn folia_to_element(doc: &Document) -> Element {
    let mut root = Element::new("FoLiA")
        .attr("xmlns", NS_FOLIA)
        .attr("xmlns:xlink", crate::xml::NS_XLINK)
        .attr("xml:id", doc.id.as_str())
        .attr_opt("version", doc.version.as_deref())
        .attr("generator", concat!("nafolia-", env!("CARGO_PKG_VERSION")));

    let mut metadata = Element::new("metadata").attr("type", "native");
    let mut annotations = Element::new("annotations");
    for decl in &doc.declarations {
        annotations.push(
            Element::new(decl.annotation_type.declaration_element())
                .attr("set", decl.set.as_str())
                .attr_opt("annotator", decl.annotator.as_deref())
                .attr_opt("datetime", decl.datetime.as_deref()),
        );
    }
    metadata.push(annotations);
    for (key, value) in &doc.metadata {
        metadata.push(Element::new("meta").attr("id", key.as_str()).text(value.as_str()));
    }
    root.push(metadata);

    let body = &doc.text;
    let mut text = Element::new("text").attr("xml:id", body.id.as_str());
    if let Some(content) = &body.content {
        text.push(Element::new("t").text(content.as_str()));
    }
    for root_structure in &body.roots {
        match *root_structure {
            Structure::Paragraph(paragraph) => {
                let paragraph = body.paragraph(paragraph);
                let mut p = Element::new("p").attr("xml:id", paragraph.id.as_str());
                for sentence in &paragraph.sentences {
                    p.push(sentence_element(body, *sentence));
                }
                text.push(p);
            }
            Structure::Sentence(sentence) => text.push(sentence_element(body, sentence)),
        }
    }
    for layer in &body.text_layers {
        text.push(layer_element(body, body.layer(*layer)));
    }
    root.push(text);
    root
}

fn sentence_element(body: &TextBody, idx: SentenceIdx) -> Element {
    let sentence = body.sentence(idx);
    let mut s = Element::new("s").attr("xml:id", sentence.id.as_str());
    for word in &sentence.words {
        s.push(word_element(body, body.word(*word)));
    }
    for layer in &sentence.layers {
        s.push(layer_element(body, body.layer(*layer)));
    }
    s
}

fn word_element(body: &TextBody, word: &Word) -> Element {
    let mut w = Element::new("w").attr("xml:id", word.id.as_str());
    if !word.space {
        w.push_attr("space", "no");
    }
    let w = w
        .attr_opt("annotator", word.provenance.annotator.as_deref())
        .attr_opt("datetime", word.provenance.datetime.as_deref());

    let mut t = Element::new("t");
    if let Some(offset) = word.offset {
        t.push_attr("offset", offset.to_string());
        t.push_attr("ref", body.id.as_str());
    }
    let mut w = w.child(t.text(word.text.as_str()));

    for annotation in &word.annotations {
        w.push(word_annotation_element(annotation));
    }
    for (n, alternative) in word.alternatives.iter().enumerate() {
        let mut alt = Element::new("alt")
            .attr("xml:id", format!("{}.alt.{}", word.id, n + 1))
            .attr("auth", "no");
        for annotation in alternative {
            alt.push(word_annotation_element(annotation));
        }
        w.push(alt);
    }
    w
}

fn word_annotation_element(annotation: &WordAnnotation) -> Element {
    match annotation {
        WordAnnotation::Pos(pos) => {
            let element = Element::new("pos")
                .attr("class", pos.class.as_str())
                .attr_opt("set", pos.set.as_deref());
            let element = with_provenance(element, &pos.provenance);
            match &pos.head {
                Some(head) => element.child(feature_element(&Feature::new("head", head.as_str()))),
                None => element,
            }
        }
        WordAnnotation::Lemma(lemma) => {
            let element = Element::new("lemma")
                .attr("class", lemma.class.as_str())
                .attr_opt("set", lemma.set.as_deref());
            with_provenance(element, &lemma.provenance)
        }
        WordAnnotation::Sense(sense) => {
            let mut element = Element::new("sense")
                .attr("class", sense.class.as_str())
                .attr_opt("set", sense.set.as_deref())
                .attr_opt("confidence", sense.confidence.map(format_confidence));
            for feature in &sense.features {
                element.push(feature_element(feature));
            }
            element
        }
    }
}

fn layer_element(body: &TextBody, layer: &Layer) -> Element {
    let mut element =
        Element::new(layer.kind.element_name()).attr_opt("set", layer.set.as_deref());
    for annotation in &layer.annotations {
        element.push(span_annotation_element(body, annotation));
    }
    element
}

fn span_annotation_element(body: &TextBody, annotation: &SpanAnnotation) -> Element {
    let element = Element::new(annotation.kind.element_name())
        .attr_opt("xml:id", annotation.id.as_deref())
        .attr_opt("set", annotation.set.as_deref())
        .attr_opt("class", annotation.class.as_deref())
        .attr_opt("confidence", annotation.confidence.map(format_confidence));
    let mut element = with_provenance(element, &annotation.provenance);

    for feature in &annotation.features {
        element.push(feature_element(feature));
    }

    match &annotation.kind {
        SpanKind::Sentiment { source, target } => {
            push_wrapped_span(&mut element, body, "hd", &annotation.span);
            push_wrapped_span(&mut element, body, "source", source);
            push_wrapped_span(&mut element, body, "target", target);
        }
        SpanKind::Dependency { head, dependent } => {
            push_wrapped_span(&mut element, body, "hd", head);
            push_wrapped_span(&mut element, body, "dep", dependent);
        }
        SpanKind::CoreferenceChain { links } => {
            push_span(&mut element, body, &annotation.span);
            for link in links {
                let mut link_element = Element::new("coreferencelink");
                push_span(&mut link_element, body, link);
                element.push(link_element);
            }
        }
        SpanKind::Predicate { roles } => {
            push_span(&mut element, body, &annotation.span);
            for role in roles {
                element.push(span_annotation_element(body, role));
            }
        }
        SpanKind::Entity | SpanKind::Chunk | SpanKind::SemanticRole => {
            push_span(&mut element, body, &annotation.span);
        }
    }

    for alignment in &annotation.alignments {
        element.push(alignment_element(alignment));
    }
    for comment in &annotation.comments {
        element.push(Element::new("comment").text(comment.as_str()));
    }
    element
}

fn push_span(element: &mut Element, body: &TextBody, span: &[WordIdx]) {
    for word in span {
        let word = body.word(*word);
        element.push(
            Element::new("wref")
                .attr("id", word.id.as_str())
                .attr("t", word.text.as_str()),
        );
    }
}

fn push_wrapped_span(element: &mut Element, body: &TextBody, name: &str, span: &[WordIdx]) {
    if span.is_empty() {
        return;
    }
    let mut wrapper = Element::new(name);
    push_span(&mut wrapper, body, span);
    element.push(wrapper);
}

fn alignment_element(alignment: &Alignment) -> Element {
    let mut element = Element::new("alignment")
        .attr_opt("class", alignment.class.as_deref())
        .attr_opt("format", alignment.format.as_deref());
    if let Some(href) = &alignment.href {
        element.push_attr("xlink:href", href.as_str());
        element.push_attr("xlink:type", "simple");
    }
    let mut element = element.attr_opt("confidence", alignment.confidence.map(format_confidence));
    for reference in &alignment.references {
        element.push(
            Element::new("aref")
                .attr("id", reference.id.as_str())
                .attr("type", reference.kind.as_str()),
        );
    }
    element
}

fn feature_element(feature: &Feature) -> Element {
    Element::new("feat")
        .attr("subset", feature.subset.as_str())
        .attr("class", feature.class.as_str())
}

fn with_provenance(element: Element, provenance: &Provenance) -> Element {
    element
        .attr_opt("annotator", provenance.annotator.as_deref())
        .attr_opt("datetime", provenance.datetime.as_deref())
}

fn format_confidence(confidence: f64) -> String {
    confidence.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folia::parse_folia;

    fn sample() -> Document {
        let mut doc = Document::new("boeing");
        doc.declare(AnnotationType::Token, "undefined");
        doc.declare(AnnotationType::Entity, "naf_entities");
        doc.metadata.insert("language".into(), "en".into());
        doc.text.content = Some("Boeing loses contract".into());
        let p = doc.text.add_paragraph("boeing.para1");
        let s = doc.text.add_sentence(Some(p), "boeing.sent1");
        let w1 = doc.text.add_word(s, "boeing.w1", "Boeing");
        doc.text.add_word(s, "boeing.w2", "loses");
        let w3 = doc.text.add_word(s, "boeing.w3", "contract");
        doc.text.word_mut(w1).offset = Some(0);
        doc.text.word_mut(w3).space = false;
        doc.text.word_mut(w1).annotations.push(WordAnnotation::Pos(PosAnnotation {
            set: Some("naf_pos".into()),
            class: "R".into(),
            head: None,
            provenance: Provenance::default(),
        }));
        doc.text.word_mut(w1).alternatives.push(vec![WordAnnotation::Sense(SenseAnnotation {
            set: Some("naf_sense_wn".into()),
            class: "00001".into(),
            confidence: Some(0.3),
            features: vec![Feature::new("pos", "n")],
        })]);
        let layer = doc.text.add_layer(
            LayerParent::Sentence(s),
            LayerKind::Entities,
            Some("naf_entities".into()),
        );
        let mut entity = SpanAnnotation::new(SpanKind::Entity);
        entity.id = Some("boeing.e1".into());
        entity.set = Some("naf_entities".into());
        entity.class = Some("ORG".into());
        entity.span = vec![w1];
        entity.alignments.push(Alignment {
            class: Some("eso".into()),
            href: Some("https://example.org/eso.owl".into()),
            format: Some("application/rdf+xml".into()),
            confidence: Some(0.5),
            references: vec![AlignReference {
                id: "http://example.org/eso#Org".into(),
                kind: "rdf:description".into(),
            }],
        });
        doc.text.layer_mut(layer).annotations.push(entity);
        doc
    }

    #[test]
    fn test_written_document_reads_back() {
        let doc = sample();
        let reread = parse_folia(&write_folia(&doc)).expect("written FoLiA parses");
        assert_eq!(reread.id, doc.id);
        assert_eq!(reread.declarations, doc.declarations);
        assert_eq!(reread.text.content, doc.text.content);
        assert_eq!(reread.text.words, doc.text.words);
        assert_eq!(reread.text.layers, doc.text.layers);
    }

    #[test]
    fn test_word_line_carries_offset_reference() {
        let written = write_folia(&sample());
        let line = written
            .lines()
            .find(|line| line.contains(">Boeing</t>"))
            .unwrap_or_default()
            .trim();
        insta::assert_snapshot!(line, @r#"<t offset="0" ref="boeing.text">Boeing</t>"#);
    }

    #[test]
    fn test_space_no_only_when_cleared() {
        let written = write_folia(&sample());
        assert_eq!(written.matches("space=\"no\"").count(), 1);
        assert!(written.contains("<w xml:id=\"boeing.w3\" space=\"no\">"));
    }

    #[test]
    fn test_alignment_uses_xlink() {
        let written = write_folia(&sample());
        assert!(written.contains("xlink:href=\"https://example.org/eso.owl\""));
        assert!(written.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""));
    }
}
