//! FoLiA reader
//!
//! # The Algorithm
//!
//!     Reading happens in two passes over the roxmltree document:
//!
//!     1. Structure: paragraphs, sentences and words are added to the [`TextBody`] arenas in
//!        document order. Annotation layers are not read yet, only remembered together with the
//!        sentence (or text body) they belong to.
//!     2. Layers: with every word indexed, the remembered layers are read and their `wref`
//!        elements are resolved to word handles. An annotation referring to a word that does not
//!        exist can not be represented: it is left out and listed in [`Document::dangling`].
//!        Roles and coreference links are dropped on their own, their predicate or chain stays.
//!
//!     Elements this model has no place for are recorded by name in
//!     [`Document::unsupported`] and otherwise ignored.

use super::*;
use crate::error::{ModelError, Result};
use crate::xml::{
    attr, child_elements, first_child, local_name, parse_document, text_content, usize_attr,
    xml_id, NS_XLINK,
};
use roxmltree::Node;

/// Parse a FoLiA document from XML source
pub fn parse_folia(source: &str) -> Result<Document> {
    let xml = parse_document(source)?;
    let root = xml.root_element();
    if local_name(root) != "FoLiA" {
        return Err(ModelError::UnexpectedRoot {
            expected: "FoLiA",
            found: local_name(root).to_string(),
        });
    }
    let id = xml_id(root).ok_or_else(|| ModelError::missing_attribute("FoLiA", "xml:id"))?;

    let mut reader = FoliaReader {
        doc: Document::new(id),
        pending: Vec::new(),
    };
    reader.doc.version = attr(root, "version");

    if let Some(metadata) = first_child(root, "metadata") {
        reader.read_metadata(metadata);
    }
    if let Some(text) = first_child(root, "text") {
        if let Some(text_id) = xml_id(text) {
            reader.doc.text.id = text_id;
        }
        reader.read_container(text, None)?;
    }
    reader.read_layers()
}

struct FoliaReader<'a, 'input> {
    doc: Document,
    /// Layer elements waiting for the second pass
    pending: Vec<(LayerParent, Node<'a, 'input>)>,
}

impl<'a, 'input> FoliaReader<'a, 'input> {
    fn read_metadata(&mut self, metadata: Node<'_, '_>) {
        for child in child_elements(metadata) {
            match local_name(child) {
                "annotations" => {
                    for decl in child_elements(child) {
                        let Some(annotation_type) =
                            AnnotationType::from_declaration_element(local_name(decl))
                        else {
                            continue;
                        };
                        self.doc.declarations.push(Declaration {
                            annotation_type,
                            set: attr(decl, "set").unwrap_or_else(|| "undefined".to_string()),
                            annotator: attr(decl, "annotator"),
                            datetime: attr(decl, "datetime"),
                        });
                    }
                }
                "meta" => {
                    if let Some(key) = attr(child, "id") {
                        self.doc.metadata.insert(key, text_content(child));
                    }
                }
                _ => {}
            }
        }
    }

    /// Read the text body or a division; `paragraph` is set while inside a `p`
    fn read_container(
        &mut self,
        node: Node<'a, 'input>,
        paragraph: Option<ParagraphIdx>,
    ) -> Result<()> {
        for child in child_elements(node) {
            let name = local_name(child);
            match name {
                "t" if paragraph.is_none() => {
                    self.doc.text.content = Some(text_content(child));
                }
                "t" => {}
                "div" => self.read_container(child, paragraph)?,
                "p" => {
                    let id = xml_id(child).unwrap_or_else(|| {
                        format!("{}.p.{}", self.doc.id, self.doc.text.paragraphs.len() + 1)
                    });
                    let idx = self.doc.text.add_paragraph(id);
                    self.read_container(child, Some(idx))?;
                }
                "s" => self.read_sentence(child, paragraph)?,
                _ if is_layer(name) => self.pending.push((LayerParent::Text, child)),
                _ => self.doc.add_unsupported(name),
            }
        }
        Ok(())
    }

    fn read_sentence(
        &mut self,
        node: Node<'a, 'input>,
        paragraph: Option<ParagraphIdx>,
    ) -> Result<()> {
        let id = xml_id(node)
            .unwrap_or_else(|| format!("{}.s.{}", self.doc.id, self.doc.text.sentences.len() + 1));
        let sentence = self.doc.text.add_sentence(paragraph, id);
        for child in child_elements(node) {
            let name = local_name(child);
            match name {
                "w" => self.read_word(child, sentence)?,
                "t" => {}
                _ if is_layer(name) => {
                    self.pending.push((LayerParent::Sentence(sentence), child))
                }
                _ => self.doc.add_unsupported(name),
            }
        }
        Ok(())
    }

    fn read_word(&mut self, node: Node<'_, '_>, sentence: SentenceIdx) -> Result<()> {
        let id = xml_id(node).ok_or_else(|| ModelError::missing_attribute("w", "xml:id"))?;
        let text_node = child_elements(node).find(|child| {
            local_name(*child) == "t" && attr(*child, "class").map_or(true, |c| c == "current")
        });
        let text = text_node.map(text_content).unwrap_or_default();
        let offset = match text_node {
            Some(t) => usize_attr(t, "offset")?,
            None => None,
        };

        let token_defaults = self.doc.default_provenance(AnnotationType::Token, None);
        let provenance = provenance(node, &token_defaults);
        let mut annotations = Vec::new();
        let mut alternatives = Vec::new();
        for child in child_elements(node) {
            match local_name(child) {
                "t" => {}
                "alt" => {
                    let mut alternative = Vec::new();
                    for annotation in child_elements(child) {
                        if let Some(annotation) = self.read_word_annotation(annotation)? {
                            alternative.push(annotation);
                        }
                    }
                    alternatives.push(alternative);
                }
                _ => {
                    if let Some(annotation) = self.read_word_annotation(child)? {
                        annotations.push(annotation);
                    }
                }
            }
        }

        let idx = self.doc.text.add_word(sentence, id, text);
        let word = self.doc.text.word_mut(idx);
        word.offset = offset;
        word.space = attr(node, "space").as_deref() != Some("no");
        word.provenance = provenance;
        word.annotations = annotations;
        word.alternatives = alternatives;
        Ok(())
    }

    fn read_word_annotation(&mut self, node: Node<'_, '_>) -> Result<Option<WordAnnotation>> {
        let name = local_name(node);
        let set = attr(node, "set");
        let annotation = match name {
            "pos" => {
                let defaults = self.doc.default_provenance(AnnotationType::Pos, set.as_deref());
                let head = attr(node, "head").or_else(|| {
                    features(node)
                        .into_iter()
                        .find(|feat| feat.subset == "head")
                        .map(|feat| feat.class)
                });
                WordAnnotation::Pos(PosAnnotation {
                    class: attr(node, "class").unwrap_or_default(),
                    head,
                    provenance: provenance(node, &defaults),
                    set,
                })
            }
            "lemma" => {
                let defaults = self.doc.default_provenance(AnnotationType::Lemma, set.as_deref());
                WordAnnotation::Lemma(LemmaAnnotation {
                    class: attr(node, "class").unwrap_or_default(),
                    provenance: provenance(node, &defaults),
                    set,
                })
            }
            "sense" => WordAnnotation::Sense(SenseAnnotation {
                class: attr(node, "class").unwrap_or_default(),
                confidence: confidence(node)?,
                features: features(node),
                set,
            }),
            _ => {
                self.doc.add_unsupported(name);
                return Ok(None);
            }
        };
        Ok(Some(annotation))
    }

    fn read_layers(mut self) -> Result<Document> {
        let pending = std::mem::take(&mut self.pending);
        for (parent, node) in pending {
            let name = local_name(node);
            let Some(kind) = layer_kind(name) else {
                continue;
            };
            let set = attr(node, "set");
            let mut annotations = Vec::new();
            for child in child_elements(node) {
                match self.read_span_annotation(child, set.as_deref()) {
                    Ok(Some(annotation)) => annotations.push(annotation),
                    Ok(None) => self.doc.add_unsupported(local_name(child)),
                    Err(err) => self.skip_dangling(child, err)?,
                }
            }
            let idx = self.doc.text.add_layer(parent, kind, set);
            self.doc.text.layer_mut(idx).annotations = annotations;
        }
        Ok(self.doc)
    }

    /// `None` for elements that are not a known span annotation
    fn read_span_annotation(
        &mut self,
        node: Node<'_, '_>,
        layer_set: Option<&str>,
    ) -> Result<Option<SpanAnnotation>> {
        let (kind, annotation_type) = match local_name(node) {
            "entity" => (SpanKind::Entity, AnnotationType::Entity),
            "chunk" => (SpanKind::Chunk, AnnotationType::Chunking),
            "dependency" => (
                SpanKind::Dependency {
                    head: self.wrefs_of_child(node, "hd")?,
                    dependent: self.wrefs_of_child(node, "dep")?,
                },
                AnnotationType::Dependency,
            ),
            "predicate" => {
                let mut roles = Vec::new();
                for role in child_elements(node).filter(|c| local_name(*c) == "semrole") {
                    match self.read_span_annotation(role, layer_set) {
                        Ok(Some(role)) => roles.push(role),
                        Ok(None) => {}
                        Err(err) => self.skip_dangling(role, err)?,
                    }
                }
                (SpanKind::Predicate { roles }, AnnotationType::Predicate)
            }
            "semrole" => (SpanKind::SemanticRole, AnnotationType::SemanticRole),
            "sentiment" => (
                SpanKind::Sentiment {
                    source: self.wrefs_of_child(node, "source")?,
                    target: self.wrefs_of_child(node, "target")?,
                },
                AnnotationType::Sentiment,
            ),
            "coreferencechain" => {
                let mut links = Vec::new();
                for link in child_elements(node).filter(|c| local_name(*c) == "coreferencelink") {
                    match self.wrefs(link) {
                        Ok(words) => links.push(words),
                        Err(err) => self.skip_dangling(link, err)?,
                    }
                }
                (
                    SpanKind::CoreferenceChain { links },
                    AnnotationType::Coreference,
                )
            }
            _ => return Ok(None),
        };

        let set = attr(node, "set").or_else(|| layer_set.map(str::to_string));
        let defaults = self.doc.default_provenance(annotation_type, set.as_deref());
        let span = match kind {
            SpanKind::Sentiment { .. } => self.wrefs_of_child(node, "hd")?,
            _ => self.wrefs(node)?,
        };

        let mut annotation = SpanAnnotation::new(kind);
        annotation.id = xml_id(node);
        annotation.class = attr(node, "class");
        annotation.confidence = confidence(node)?;
        annotation.span = span;
        annotation.features = features(node);
        annotation.alignments = child_elements(node)
            .filter(|c| local_name(*c) == "alignment")
            .map(read_alignment)
            .collect::<Result<_>>()?;
        annotation.comments = child_elements(node)
            .filter(|c| local_name(*c) == "comment")
            .map(text_content)
            .collect();
        annotation.provenance = provenance(node, &defaults);
        annotation.set = set;
        Ok(Some(annotation))
    }

    /// Words referenced by the direct `wref` children of `node`
    fn wrefs(&self, node: Node<'_, '_>) -> Result<Vec<WordIdx>> {
        child_elements(node)
            .filter(|child| local_name(*child) == "wref")
            .map(|wref| {
                let id = attr(wref, "id")
                    .ok_or_else(|| ModelError::missing_attribute("wref", "id"))?;
                self.doc
                    .text
                    .word_by_id(&id)
                    .ok_or_else(|| ModelError::UnknownWordReference {
                        element: local_name(node).to_string(),
                        id,
                    })
            })
            .collect()
    }

    /// Record `node` as dropped when `err` is an unresolved word reference, fail otherwise
    fn skip_dangling(&mut self, node: Node<'_, '_>, err: ModelError) -> Result<()> {
        match err {
            ModelError::UnknownWordReference { id, .. } => {
                self.doc.dangling.push(DanglingReference {
                    element: local_name(node).to_string(),
                    annotation: xml_id(node),
                    word: id,
                });
                Ok(())
            }
            err => Err(err),
        }
    }

    fn wrefs_of_child(&self, node: Node<'_, '_>, name: &str) -> Result<Vec<WordIdx>> {
        match first_child(node, name) {
            Some(child) => self.wrefs(child),
            None => Ok(Vec::new()),
        }
    }
}

fn is_layer(name: &str) -> bool {
    layer_kind(name).is_some()
}

fn layer_kind(name: &str) -> Option<LayerKind> {
    match name {
        "entities" => Some(LayerKind::Entities),
        "chunking" => Some(LayerKind::Chunking),
        "dependencies" => Some(LayerKind::Dependencies),
        "semroles" => Some(LayerKind::SemanticRoles),
        "sentiments" => Some(LayerKind::Sentiments),
        "coreferences" => Some(LayerKind::Coreferences),
        _ => None,
    }
}

fn provenance(node: Node<'_, '_>, defaults: &Provenance) -> Provenance {
    Provenance {
        annotator: attr(node, "annotator").or_else(|| defaults.annotator.clone()),
        datetime: attr(node, "datetime").or_else(|| defaults.datetime.clone()),
    }
}

fn features(node: Node<'_, '_>) -> Vec<Feature> {
    child_elements(node)
        .filter(|child| local_name(*child) == "feat")
        .filter_map(|feat| Some(Feature::new(attr(feat, "subset")?, attr(feat, "class")?)))
        .collect()
}

fn confidence(node: Node<'_, '_>) -> Result<Option<f64>> {
    match node.attribute("confidence") {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ModelError::invalid_attribute(local_name(node), "confidence", value)),
    }
}

fn read_alignment(node: Node<'_, '_>) -> Result<Alignment> {
    Ok(Alignment {
        class: attr(node, "class"),
        href: node
            .attribute((NS_XLINK, "href"))
            .or_else(|| node.attribute("href"))
            .map(str::to_string),
        format: attr(node, "format"),
        confidence: confidence(node)?,
        references: child_elements(node)
            .filter(|child| local_name(*child) == "aref")
            .filter_map(|aref| {
                Some(AlignReference {
                    id: attr(aref, "id")?,
                    kind: attr(aref, "type").unwrap_or_default(),
                })
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FoLiA xmlns="http://ilk.uvt.nl/folia" xml:id="example" version="1.2.0">
  <metadata type="native">
    <annotations>
      <token-annotation set="tokconfig-en" annotator="ucto" datetime="2015-01-01T12:00:00"/>
      <pos-annotation set="penn"/>
      <entity-annotation set="conll"/>
    </annotations>
    <meta id="language">en</meta>
  </metadata>
  <text xml:id="example.text">
    <p xml:id="example.p.1">
      <s xml:id="example.p.1.s.1">
        <w xml:id="example.w1"><t>Boeing</t><pos class="NNP" head="N"/><lemma class="Boeing"/></w>
        <w xml:id="example.w2"><t>loses</t><pos class="VBZ"><feat subset="head" class="V"/></pos></w>
        <w xml:id="example.w3" space="no"><t>contract</t></w>
        <w xml:id="example.w4"><t>.</t></w>
        <entities>
          <entity xml:id="example.e1" class="ORG"><wref id="example.w1" t="Boeing"/></entity>
        </entities>
        <dependencies>
          <dependency class="SBJ"><hd><wref id="example.w2"/></hd><dep><wref id="example.w1"/></dep></dependency>
        </dependencies>
        <semroles/>
      </s>
    </p>
  </text>
</FoLiA>"#;

    #[test]
    fn test_reads_structure_and_words() {
        let doc = parse_folia(SAMPLE).expect("valid FoLiA");
        assert_eq!(doc.id, "example");
        assert_eq!(doc.language(), Some("en"));
        assert_eq!(doc.text.paragraphs.len(), 1);
        assert_eq!(doc.text.words.len(), 4);
        let contract = doc.text.word_by_id("example.w3").expect("w3");
        assert!(!doc.text.word(contract).space);
    }

    #[test]
    fn test_word_provenance_falls_back_to_declaration() {
        let doc = parse_folia(SAMPLE).expect("valid FoLiA");
        let word = &doc.text.words[0];
        assert_eq!(word.provenance.annotator.as_deref(), Some("ucto"));
    }

    #[test]
    fn test_pos_head_from_attribute_or_feature() {
        let doc = parse_folia(SAMPLE).expect("valid FoLiA");
        let heads: Vec<_> = doc.text.words[..2]
            .iter()
            .map(|w| w.pos_annotations().next().and_then(|p| p.head.clone()))
            .collect();
        assert_eq!(heads, vec![Some("N".to_string()), Some("V".to_string())]);
    }

    #[test]
    fn test_layers_resolve_word_references() {
        let doc = parse_folia(SAMPLE).expect("valid FoLiA");
        let entities = doc.text.annotations(LayerKind::Entities);
        assert_eq!(entities[0].class.as_deref(), Some("ORG"));
        assert_eq!(entities[0].span, vec![doc.text.word_by_id("example.w1").unwrap()]);
        let deps = doc.text.annotations(LayerKind::Dependencies);
        assert!(matches!(&deps[0].kind, SpanKind::Dependency { head, .. } if head.len() == 1));
    }

    #[test]
    fn test_dangling_wref_drops_only_its_annotation() {
        let source = SAMPLE.replace(r#"<wref id="example.w1" t="Boeing"/>"#, r#"<wref id="example.w9"/>"#);
        let doc = parse_folia(&source).expect("dangling references are not fatal");
        assert_eq!(doc.dangling.len(), 1);
        assert_eq!(doc.dangling[0].word, "example.w9");
        assert!(doc.text.annotations(LayerKind::Entities).is_empty());
        assert_eq!(doc.text.annotations(LayerKind::Dependencies).len(), 1);
    }

    #[test]
    fn test_wref_without_id_is_an_error() {
        let source = SAMPLE.replace(r#"<wref id="example.w1" t="Boeing"/>"#, r#"<wref t="Boeing"/>"#);
        let err = parse_folia(&source).unwrap_err();
        assert!(matches!(err, ModelError::MissingAttribute { .. }));
    }

    #[test]
    fn test_missing_document_id() {
        let err = parse_folia(r#"<FoLiA xmlns="http://ilk.uvt.nl/folia"/>"#).unwrap_err();
        assert!(matches!(err, ModelError::MissingAttribute { .. }));
    }
}
