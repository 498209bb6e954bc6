//! NAF writer
//!
//! Builds an [`Element`] tree in canonical layer order and serializes it. Empty layers are
//! omitted, except the text layer which is always written.

use super::*;
use crate::xml::{to_document_string, Element};

/// Serialize a NAF document to an XML string
pub fn write_naf(doc: &NafDocument) -> String {
    to_document_string(&naf_to_element(doc))
}

/// Build the element tree of a NAF document
pub fn naf_to_element(doc: &NafDocument) -> Element {
    let mut root = Element::new("NAF")
        .attr_opt("xml:lang", doc.lang.as_deref())
        .attr_opt("version", doc.version.as_deref());

    root.push(header_element(&doc.header));

    if let Some(raw) = &doc.raw {
        root.push(Element::new("raw").text(raw.as_str()));
    }

    let mut text = Element::new("text");
    for token in &doc.tokens {
        text.push(
            Element::new("wf")
                .attr("id", token.id.as_str())
                .attr("sent", token.sent.as_str())
                .attr_opt("para", token.para.as_deref())
                .attr_opt("offset", token.offset.map(|o| o.to_string()))
                .attr_opt("length", token.length.map(|l| l.to_string()))
                .text(token.text.as_str()),
        );
    }
    root.push(text);

    let refs = &doc.external_refs;

    push_layer(&mut root, "terms", &doc.terms, |term| {
        let mut element = Element::new("term")
            .attr("id", term.id.as_str())
            .attr_opt("type", term.term_type.as_deref())
            .attr_opt("lemma", term.lemma.as_deref())
            .attr_opt("pos", term.pos.as_deref())
            .attr_opt("morphofeat", term.morphofeat.as_deref())
            .child(span_element(&term.span));
        push_external_references(&mut element, refs, &term.external_refs);
        element
    });

    push_layer(&mut root, "entities", &doc.entities, |entity| {
        let mut element = Element::new("entity")
            .attr("id", entity.id.as_str())
            .attr_opt("type", entity.entity_type.as_deref());
        for span in &entity.references {
            element.push(Element::new("references").child(span_element(span)));
        }
        push_external_references(&mut element, refs, &entity.external_refs);
        element
    });

    push_layer(&mut root, "markables", &doc.markables, |mark| {
        let mut element = Element::new("mark")
            .attr("id", mark.id.as_str())
            .attr_opt("lemma", mark.lemma.as_deref())
            .attr_opt("source", mark.source.as_deref())
            .child(span_element(&mark.span));
        push_external_references(&mut element, refs, &mark.external_refs);
        element
    });

    push_layer(&mut root, "deps", &doc.dependencies, |dep| {
        Element::new("dep")
            .attr("from", dep.from.as_str())
            .attr("to", dep.to.as_str())
            .attr_opt("rfunc", dep.function.as_deref())
    });

    push_layer(&mut root, "chunks", &doc.chunks, |chunk| {
        Element::new("chunk")
            .attr("id", chunk.id.as_str())
            .attr_opt("head", chunk.head.as_deref())
            .attr_opt("phrase", chunk.phrase.as_deref())
            .attr_opt("case", chunk.case.as_deref())
            .child(span_element(&chunk.span))
    });

    push_layer(&mut root, "coreferences", &doc.coreferences, |coref| {
        let mut element = Element::new("coref")
            .attr("id", coref.id.as_str())
            .attr_opt("type", coref.coref_type.as_deref());
        for span in &coref.spans {
            element.push(span_element(span));
        }
        push_external_references(&mut element, refs, &coref.external_refs);
        element
    });

    push_layer(&mut root, "srl", &doc.predicates, |predicate| {
        let mut element = Element::new("predicate")
            .attr("id", predicate.id.as_str())
            .attr_opt("uri", predicate.uri.as_deref())
            .attr_opt("confidence", predicate.confidence.as_deref());
        push_external_references(&mut element, refs, &predicate.external_refs);
        element.push(span_element(&predicate.span));
        for role in &predicate.roles {
            let mut role_element = Element::new("role")
                .attr("id", role.id.as_str())
                .attr_opt("semRole", role.sem_role.as_deref());
            push_external_references(&mut role_element, refs, &role.external_refs);
            role_element.push(span_element(&role.span));
            element.push(role_element);
        }
        element
    });

    push_layer(&mut root, "timeExpressions", &doc.time_expressions, |timex| {
        let mut element = Element::new("timex3")
            .attr("id", timex.id.as_str())
            .attr_opt("type", timex.timex_type.as_deref());
        for (name, value) in timex.features() {
            element.push_attr(name, value);
        }
        let mut element = element.attr_opt("comment", timex.comment.as_deref());
        if !timex.span.is_empty() {
            element.push(span_element(&timex.span));
        }
        element
    });

    push_layer(&mut root, "opinions", &doc.opinions, |opinion| {
        let mut element = Element::new("opinion").attr("id", opinion.id.as_str());
        if let Some(holder) = &opinion.holder {
            element.push(Element::new("opinion_holder").child(span_element(&holder.span)));
        }
        if let Some(target) = &opinion.target {
            element.push(Element::new("opinion_target").child(span_element(&target.span)));
        }
        if let Some(expression) = &opinion.expression {
            element.push(
                Element::new("opinion_expression")
                    .attr_opt("polarity", expression.polarity.as_deref())
                    .attr_opt("strength", expression.strength.as_deref())
                    .attr_opt("subjectivity", expression.subjectivity.as_deref())
                    .attr_opt(
                        "sentiment_semantic_type",
                        expression.sentiment_semantic_type.as_deref(),
                    )
                    .attr_opt(
                        "sentiment_product_feature",
                        expression.sentiment_product_feature.as_deref(),
                    )
                    .child(span_element(&expression.span)),
            );
        }
        element
    });

    root
}

fn push_layer<T>(root: &mut Element, name: &str, items: &[T], build: impl Fn(&T) -> Element) {
    if items.is_empty() {
        return;
    }
    let mut layer = Element::new(name);
    for item in items {
        layer.push(build(item));
    }
    root.push(layer);
}

fn header_element(header: &NafHeader) -> Element {
    let mut element = Element::new("nafHeader");
    if let Some(desc) = &header.file_desc {
        let mut file_desc = Element::new("fileDesc");
        for (name, value) in desc.fields() {
            file_desc.push_attr(name, value);
        }
        element.push(file_desc);
    }
    if let Some(public) = &header.public {
        element.push(
            Element::new("public")
                .attr_opt("publicId", public.public_id.as_deref())
                .attr_opt("uri", public.uri.as_deref()),
        );
    }
    for lps in &header.processors {
        let mut block = Element::new("linguisticProcessors").attr("layer", lps.layer.as_str());
        for lp in &lps.processors {
            block.push(
                Element::new("lp")
                    .attr("name", lp.name.as_str())
                    .attr_opt("version", lp.version.as_deref())
                    .attr_opt("timestamp", lp.timestamp.as_deref())
                    .attr_opt("beginTimestamp", lp.begin_timestamp.as_deref())
                    .attr_opt("endTimestamp", lp.end_timestamp.as_deref())
                    .attr_opt("hostname", lp.hostname.as_deref()),
            );
        }
        element.push(block);
    }
    element
}

fn span_element(ids: &[String]) -> Element {
    let mut span = Element::new("span");
    for id in ids {
        span.push(Element::new("target").attr("id", id.as_str()));
    }
    span
}

fn push_external_references(element: &mut Element, refs: &ExternalRefs, ids: &[ExternalRefId]) {
    if ids.is_empty() {
        return;
    }
    let mut block = Element::new("externalReferences");
    for id in ids {
        block.push(external_ref_element(refs, *id, &mut Vec::new()));
    }
    element.push(block);
}

/// `path` holds the ancestors of `id`; a child that is already on the path is not written again
fn external_ref_element(refs: &ExternalRefs, id: ExternalRefId, path: &mut Vec<ExternalRefId>) -> Element {
    let exref = refs.get(id);
    let mut element = Element::new("externalRef")
        .attr("resource", exref.resource.as_str())
        .attr("reference", exref.reference.as_str())
        .attr_opt("confidence", exref.confidence.as_deref())
        .attr_opt("source", exref.source.as_deref())
        .attr_opt("reftype", exref.reftype.as_deref());
    path.push(id);
    for child in &exref.children {
        if !path.contains(child) {
            element.push(external_ref_element(refs, *child, path));
        }
    }
    path.pop();
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naf::parse_naf;

    fn sample() -> NafDocument {
        let mut doc = NafDocument {
            lang: Some("en".into()),
            version: Some("v3".into()),
            raw: Some("Boeing loses".into()),
            ..NafDocument::default()
        };
        doc.tokens.push(Token {
            id: "w1".into(),
            sent: "1".into(),
            para: Some("1".into()),
            offset: Some(0),
            length: Some(6),
            text: "Boeing".into(),
            malformed_position: None,
        });
        doc.tokens.push(Token {
            id: "w2".into(),
            sent: "1".into(),
            para: Some("1".into()),
            offset: Some(7),
            length: Some(5),
            text: "loses".into(),
            malformed_position: None,
        });
        let exref = doc
            .external_refs
            .add(ExternalRef::new("WordNet-3.0", "eng-30-00000001-v").with_confidence("0.8"));
        doc.terms.push(Term {
            id: "t1".into(),
            span: vec!["w2".into()],
            lemma: Some("lose".into()),
            pos: Some("V".into()),
            external_refs: vec![exref],
            ..Term::default()
        });
        doc
    }

    #[test]
    fn test_written_document_reads_back() {
        let doc = sample();
        let reread = parse_naf(&write_naf(&doc)).expect("written NAF parses");
        assert_eq!(reread.tokens, doc.tokens);
        assert_eq!(reread.terms, doc.terms);
        assert_eq!(reread.raw, doc.raw);
        assert_eq!(reread.lang, doc.lang);
    }

    #[test]
    fn test_empty_layers_are_omitted() {
        let written = write_naf(&sample());
        assert!(written.contains("<text>"));
        assert!(!written.contains("<entities"));
        assert!(!written.contains("<deps"));
    }

    #[test]
    fn test_cyclic_external_refs_are_cut() {
        let mut doc = NafDocument::new();
        let a = doc.external_refs.add(ExternalRef::new("A", "a"));
        let b = doc.external_refs.add_child(a, ExternalRef::new("B", "b"));
        doc.external_refs.link(b, a);
        doc.terms.push(Term {
            id: "t1".into(),
            external_refs: vec![a],
            ..Term::default()
        });
        let written = write_naf(&doc);
        assert_eq!(written.matches("<externalRef ").count(), 2);
    }

    #[test]
    fn test_header_line() {
        let mut doc = NafDocument::new();
        doc.add_processor(
            "text",
            Processor {
                name: "nafolia".into(),
                version: Some("0.1.0".into()),
                timestamp: Some("2024-01-01T00:00:00Z".into()),
                ..Processor::default()
            },
        );
        let written = write_naf(&doc);
        let line = written
            .lines()
            .find(|line| line.contains("<lp "))
            .unwrap_or_default()
            .trim();
        insta::assert_snapshot!(line, @r#"<lp name="nafolia" version="0.1.0" timestamp="2024-01-01T00:00:00Z"/>"#);
    }
}
