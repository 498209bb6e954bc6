//! NAF reader
//!
//! Walks the roxmltree document once, layer by layer. Unknown layers are skipped silently,
//! layers NAF defines but nafolia does not model are recorded in
//! [`NafDocument::unsupported`](super::NafDocument::unsupported).

use super::*;
use crate::error::{ModelError, Result};
use crate::xml::{
    attr, child_elements, first_child, local_name, parse_document, required_attr, text_content,
    NS_XML,
};
use roxmltree::Node;

/// Parse a NAF document from XML source
pub fn parse_naf(source: &str) -> Result<NafDocument> {
    let xml = parse_document(source)?;
    let root = xml.root_element();
    if local_name(root) != "NAF" {
        return Err(ModelError::UnexpectedRoot {
            expected: "NAF",
            found: local_name(root).to_string(),
        });
    }

    let mut doc = NafDocument {
        lang: root.attribute((NS_XML, "lang")).map(str::to_string),
        version: attr(root, "version"),
        ..NafDocument::default()
    };

    for layer in child_elements(root) {
        match local_name(layer) {
            "nafHeader" => doc.header = read_header(layer)?,
            "raw" => doc.raw = Some(text_content(layer)),
            "text" => {
                for wf in children_named(layer, "wf") {
                    doc.tokens.push(read_token(wf)?);
                }
            }
            "terms" => {
                for term in children_named(layer, "term") {
                    let term = read_term(term, &mut doc.external_refs)?;
                    doc.terms.push(term);
                }
            }
            "entities" => {
                for entity in children_named(layer, "entity") {
                    let entity = read_entity(entity, &mut doc.external_refs)?;
                    doc.entities.push(entity);
                }
            }
            "markables" => {
                for mark in children_named(layer, "mark") {
                    let markable = Markable {
                        id: required_attr(mark, "id")?,
                        lemma: attr(mark, "lemma"),
                        source: attr(mark, "source"),
                        span: span_targets(mark),
                        external_refs: read_external_references(mark, &mut doc.external_refs),
                    };
                    doc.markables.push(markable);
                }
            }
            "deps" => {
                for dep in children_named(layer, "dep") {
                    doc.dependencies.push(Dependency {
                        from: required_attr(dep, "from")?,
                        to: required_attr(dep, "to")?,
                        function: attr(dep, "rfunc"),
                    });
                }
            }
            "chunks" => {
                for chunk in children_named(layer, "chunk") {
                    doc.chunks.push(Chunk {
                        id: required_attr(chunk, "id")?,
                        head: attr(chunk, "head"),
                        phrase: attr(chunk, "phrase"),
                        case: attr(chunk, "case"),
                        span: span_targets(chunk),
                    });
                }
            }
            "coreferences" => {
                for coref in children_named(layer, "coref") {
                    let coreference = Coreference {
                        id: required_attr(coref, "id")?,
                        coref_type: attr(coref, "type"),
                        spans: children_named(coref, "span")
                            .map(|span| targets(span))
                            .collect(),
                        external_refs: read_external_references(coref, &mut doc.external_refs),
                    };
                    doc.coreferences.push(coreference);
                }
            }
            "srl" => {
                for predicate in children_named(layer, "predicate") {
                    let predicate = read_predicate(predicate, &mut doc.external_refs)?;
                    doc.predicates.push(predicate);
                }
            }
            "timeExpressions" => {
                for timex in children_named(layer, "timex3") {
                    doc.time_expressions.push(read_timex(timex)?);
                }
            }
            "opinions" => {
                for opinion in children_named(layer, "opinion") {
                    doc.opinions.push(read_opinion(opinion)?);
                }
            }
            other => {
                if let Some(unsupported) = UnsupportedLayer::from_element(other) {
                    if !doc.unsupported.contains(&unsupported) {
                        doc.unsupported.push(unsupported);
                    }
                }
            }
        }
    }

    Ok(doc)
}

fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    child_elements(node).filter(move |child| local_name(*child) == name)
}

/// Ids of the `target` children of a `span` element
fn targets(span: Node<'_, '_>) -> Vec<String> {
    children_named(span, "target")
        .filter_map(|target| attr(target, "id"))
        .collect()
}

/// Targets of the first `span` child, empty when there is none
fn span_targets(node: Node<'_, '_>) -> Vec<String> {
    first_child(node, "span").map(targets).unwrap_or_default()
}

fn read_header(header: Node<'_, '_>) -> Result<NafHeader> {
    let mut result = NafHeader::default();
    for child in child_elements(header) {
        match local_name(child) {
            "fileDesc" => {
                result.file_desc = Some(FileDesc {
                    title: attr(child, "title"),
                    author: attr(child, "author"),
                    creationtime: attr(child, "creationtime"),
                    location: attr(child, "location"),
                    filename: attr(child, "filename"),
                    filetype: attr(child, "filetype"),
                    publisher: attr(child, "publisher"),
                    magazine: attr(child, "magazine"),
                    section: attr(child, "section"),
                })
            }
            "public" => {
                result.public = Some(Public {
                    public_id: attr(child, "publicId"),
                    uri: attr(child, "uri"),
                })
            }
            "linguisticProcessors" => {
                let mut processors = Vec::new();
                for lp in children_named(child, "lp") {
                    processors.push(Processor {
                        name: required_attr(lp, "name")?,
                        version: attr(lp, "version"),
                        timestamp: attr(lp, "timestamp"),
                        begin_timestamp: attr(lp, "beginTimestamp"),
                        end_timestamp: attr(lp, "endTimestamp"),
                        hostname: attr(lp, "hostname"),
                    });
                }
                result.processors.push(LinguisticProcessors {
                    layer: required_attr(child, "layer")?,
                    processors,
                });
            }
            _ => {}
        }
    }
    Ok(result)
}

fn read_token(wf: Node<'_, '_>) -> Result<Token> {
    let mut malformed = Vec::new();
    let mut position = |name: &str| {
        let value = wf.attribute(name)?;
        let parsed = value.trim().parse::<usize>().ok();
        if parsed.is_none() {
            malformed.push(format!("{name}=\"{value}\""));
        }
        parsed
    };
    let (offset, length) = (position("offset"), position("length"));
    let (offset, length, malformed_position) = if malformed.is_empty() {
        (offset, length, None)
    } else {
        (None, None, Some(malformed.join(" ")))
    };
    Ok(Token {
        id: required_attr(wf, "id")?,
        sent: required_attr(wf, "sent")?,
        para: attr(wf, "para"),
        offset,
        length,
        text: text_content(wf),
        malformed_position,
    })
}

fn read_term(term: Node<'_, '_>, refs: &mut ExternalRefs) -> Result<Term> {
    Ok(Term {
        id: required_attr(term, "id")?,
        span: span_targets(term),
        term_type: attr(term, "type"),
        lemma: attr(term, "lemma"),
        pos: attr(term, "pos"),
        morphofeat: attr(term, "morphofeat"),
        external_refs: read_external_references(term, refs),
        has_sentiment: first_child(term, "sentiment").is_some(),
    })
}

fn read_entity(entity: Node<'_, '_>, refs: &mut ExternalRefs) -> Result<Entity> {
    let references = children_named(entity, "references")
        .map(|block| {
            children_named(block, "span")
                .flat_map(|span| targets(span))
                .collect::<Vec<_>>()
        })
        .collect();
    Ok(Entity {
        id: required_attr(entity, "id")?,
        entity_type: attr(entity, "type"),
        references,
        external_refs: read_external_references(entity, refs),
    })
}

fn read_predicate(predicate: Node<'_, '_>, refs: &mut ExternalRefs) -> Result<Predicate> {
    let mut roles = Vec::new();
    for role in children_named(predicate, "role") {
        roles.push(Role {
            id: required_attr(role, "id")?,
            sem_role: attr(role, "semRole"),
            span: span_targets(role),
            external_refs: read_external_references(role, refs),
        });
    }
    Ok(Predicate {
        id: required_attr(predicate, "id")?,
        uri: attr(predicate, "uri"),
        confidence: attr(predicate, "confidence"),
        span: span_targets(predicate),
        roles,
        external_refs: read_external_references(predicate, refs),
    })
}

fn read_timex(timex: Node<'_, '_>) -> Result<TimeExpression> {
    Ok(TimeExpression {
        id: required_attr(timex, "id")?,
        timex_type: attr(timex, "type"),
        value: attr(timex, "value"),
        modifier: attr(timex, "mod"),
        quant: attr(timex, "quant"),
        freq: attr(timex, "freq"),
        temporal_function: attr(timex, "temporalFunction"),
        value_from_function: attr(timex, "valueFromFunction"),
        function_in_document: attr(timex, "functionInDocument"),
        comment: attr(timex, "comment"),
        span: span_targets(timex),
    })
}

fn read_opinion(opinion: Node<'_, '_>) -> Result<Opinion> {
    let part = |name: &str| first_child(opinion, name);
    Ok(Opinion {
        id: required_attr(opinion, "id")?,
        holder: part("opinion_holder").map(|holder| OpinionSpan {
            span: span_targets(holder),
        }),
        target: part("opinion_target").map(|target| OpinionSpan {
            span: span_targets(target),
        }),
        expression: part("opinion_expression").map(|expression| OpinionExpression {
            polarity: attr(expression, "polarity"),
            strength: attr(expression, "strength"),
            subjectivity: attr(expression, "subjectivity"),
            sentiment_semantic_type: attr(expression, "sentiment_semantic_type"),
            sentiment_product_feature: attr(expression, "sentiment_product_feature"),
            span: span_targets(expression),
        }),
    })
}

/// Read the `externalReferences` block of an element into the arena, returning the top-level ids
fn read_external_references(node: Node<'_, '_>, refs: &mut ExternalRefs) -> Vec<ExternalRefId> {
    match first_child(node, "externalReferences") {
        Some(block) => children_named(block, "externalRef")
            .map(|exref| read_external_ref(exref, refs))
            .collect(),
        None => Vec::new(),
    }
}

fn read_external_ref(node: Node<'_, '_>, refs: &mut ExternalRefs) -> ExternalRefId {
    let id = refs.add(ExternalRef {
        resource: attr(node, "resource").unwrap_or_default(),
        reference: attr(node, "reference").unwrap_or_default(),
        confidence: attr(node, "confidence"),
        source: attr(node, "source"),
        reftype: attr(node, "reftype"),
        children: Vec::new(),
    });
    for child in children_named(node, "externalRef") {
        let child = read_external_ref(child, refs);
        refs.link(id, child);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NAF xml:lang="en" version="v3">
  <nafHeader>
    <fileDesc title="Boeing" creationtime="2013-01-01T00:00:00Z"/>
    <public publicId="boeing01" uri="http://example.org/boeing01"/>
    <linguisticProcessors layer="terms">
      <lp name="ixa-pipe-pos" version="1.0" timestamp="2013-01-01T00:00:00Z"/>
    </linguisticProcessors>
  </nafHeader>
  <raw>Boeing loses contract</raw>
  <text>
    <wf id="w1" sent="1" para="1" offset="0" length="6">Boeing</wf>
    <wf id="w2" sent="1" para="1" offset="7" length="5">loses</wf>
    <wf id="w3" sent="1" para="1" offset="13" length="8">contract</wf>
  </text>
  <terms>
    <term id="t1" lemma="Boeing" pos="R" morphofeat="NNP">
      <span><target id="w1"/></span>
    </term>
    <term id="t2" lemma="lose" pos="V" morphofeat="VBZ">
      <span><target id="w2"/></span>
      <externalReferences>
        <externalRef resource="wn30g.bin64" reference="ili-30-00000000-v" confidence="0.9">
          <externalRef resource="WordNet-3.0" reference="eng-30-00000001-v"/>
        </externalRef>
      </externalReferences>
    </term>
  </terms>
  <entities>
    <entity id="e1" type="ORG">
      <references><span><target id="t1"/></span></references>
    </entity>
  </entities>
  <deps>
    <dep from="t2" to="t1" rfunc="SBJ"/>
  </deps>
  <constituency/>
</NAF>"#;

    #[test]
    fn test_reads_tokens_and_terms() {
        let doc = parse_naf(SAMPLE).expect("valid NAF");
        assert_eq!(doc.lang.as_deref(), Some("en"));
        assert_eq!(doc.tokens.len(), 3);
        assert_eq!(doc.tokens[2].offset, Some(13));
        assert_eq!(doc.terms[1].lemma.as_deref(), Some("lose"));
        assert_eq!(doc.terms[1].span, vec!["w2"]);
        assert_eq!(doc.raw.as_deref(), Some("Boeing loses contract"));
    }

    #[test]
    fn test_reads_nested_external_refs() {
        let doc = parse_naf(SAMPLE).expect("valid NAF");
        let top = doc.terms[1].external_refs[0];
        let exref = doc.external_refs.get(top);
        assert_eq!(exref.confidence.as_deref(), Some("0.9"));
        assert_eq!(exref.children.len(), 1);
        assert_eq!(doc.external_refs.get(exref.children[0]).resource, "WordNet-3.0");
    }

    #[test]
    fn test_reads_header_entities_and_deps() {
        let doc = parse_naf(SAMPLE).expect("valid NAF");
        let public = doc.header.public.as_ref().expect("public");
        assert_eq!(public.public_id.as_deref(), Some("boeing01"));
        assert_eq!(doc.processors("terms")[0].name, "ixa-pipe-pos");
        assert_eq!(doc.entities[0].references, vec![vec!["t1".to_string()]]);
        assert_eq!(doc.dependencies[0].function.as_deref(), Some("SBJ"));
    }

    #[test]
    fn test_records_unsupported_layers() {
        let doc = parse_naf(SAMPLE).expect("valid NAF");
        assert_eq!(doc.unsupported, vec![UnsupportedLayer::Constituency]);
    }

    #[test]
    fn test_rejects_other_roots() {
        let err = parse_naf("<FoLiA/>").unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedRoot { .. }));
    }

    #[test]
    fn test_keeps_token_with_bad_offset() {
        let source = r#"<NAF><text><wf id="w1" sent="1" offset="x" length="1">a</wf></text></NAF>"#;
        let doc = parse_naf(source).expect("a bad offset is not fatal");
        let token = &doc.tokens[0];
        assert_eq!((token.offset, token.length), (None, None));
        assert_eq!(token.malformed_position.as_deref(), Some(r#"offset="x""#));
        assert_eq!(token.text, "a");
    }
}
