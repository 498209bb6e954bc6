//! On-demand containers
//!
//! Sentences, paragraphs and annotation layers of the generated FoLiA document are created the
//! first time something needs them. Both caches here are keyed maps, so asking twice for the
//! same key always yields the same container regardless of the order items arrive in.

use crate::ids::TargetIds;
use nafolia_model::folia::{LayerIdx, LayerKind, LayerParent, ParagraphIdx, SentenceIdx, TextBody};
use std::collections::HashMap;

/// Annotation layers keyed by (parent, layer kind, set)
#[derive(Debug, Default)]
pub struct ContainerCache {
    layers: HashMap<(LayerParent, LayerKind, String), LayerIdx>,
}

impl ContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &mut self,
        body: &mut TextBody,
        parent: LayerParent,
        kind: LayerKind,
        set: &str,
    ) -> LayerIdx {
        *self
            .layers
            .entry((parent, kind, set.to_string()))
            .or_insert_with(|| body.add_layer(parent, kind, Some(set.to_string())))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Paragraphs and sentences keyed by their NAF `para` and `sent` values
#[derive(Debug, Default)]
pub struct StructureBuilder {
    paragraphs: HashMap<String, ParagraphIdx>,
    sentences: HashMap<String, SentenceIdx>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sentence for a token, creating its paragraph (if any) and the sentence on first sight
    pub fn place(
        &mut self,
        body: &mut TextBody,
        ids: &TargetIds,
        para: Option<&str>,
        sent: &str,
    ) -> SentenceIdx {
        if let Some(sentence) = self.sentences.get(sent) {
            return *sentence;
        }
        let paragraph = para.map(|para| {
            *self
                .paragraphs
                .entry(para.to_string())
                .or_insert_with(|| body.add_paragraph(ids.paragraph(para)))
        });
        let sentence = body.add_sentence(paragraph, ids.sentence(sent));
        self.sentences.insert(sent.to_string(), sentence);
        sentence
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_layer() {
        let mut body = TextBody::new("d.text");
        let s = body.add_sentence(None, "d.sent1");
        let mut cache = ContainerCache::new();
        let parent = LayerParent::Sentence(s);
        let a = cache.get_or_create(&mut body, parent, LayerKind::Entities, "naf_entities");
        let b = cache.get_or_create(&mut body, parent, LayerKind::Entities, "naf_entities");
        assert_eq!(a, b);
        assert_eq!(body.layers.len(), 1);
        assert_eq!(body.sentence(s).layers, vec![a]);
    }

    #[test]
    fn test_different_set_or_parent_new_layer() {
        let mut body = TextBody::new("d.text");
        let s = body.add_sentence(None, "d.sent1");
        let mut cache = ContainerCache::new();
        let parent = LayerParent::Sentence(s);
        let a = cache.get_or_create(&mut body, parent, LayerKind::Entities, "naf_entities");
        let b = cache.get_or_create(&mut body, parent, LayerKind::Entities, "naf_timex3");
        let c = cache.get_or_create(&mut body, LayerParent::Text, LayerKind::Entities, "naf_entities");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 3);
        assert_eq!(body.text_layers, vec![c]);
    }

    #[test]
    fn test_structure_builder_keys_by_source_ids() {
        let mut body = TextBody::new("d.text");
        let ids = TargetIds::new("d");
        let mut builder = StructureBuilder::new();
        let s1 = builder.place(&mut body, &ids, Some("1"), "1");
        let again = builder.place(&mut body, &ids, Some("1"), "1");
        let s2 = builder.place(&mut body, &ids, Some("2"), "2");
        assert_eq!(s1, again);
        assert_ne!(s1, s2);
        assert_eq!(body.paragraphs.len(), 2);
        let p2 = body.sentence(s2).paragraph.expect("in a paragraph");
        assert_eq!(body.paragraph(p2).id, "d.para2");
        assert_eq!(body.sentence(s1).id, "d.sent1");
    }

    #[test]
    fn test_sentences_without_paragraph_attach_to_text() {
        let mut body = TextBody::new("d.text");
        let ids = TargetIds::new("d");
        let mut builder = StructureBuilder::new();
        builder.place(&mut body, &ids, None, "1");
        builder.place(&mut body, &ids, None, "2");
        assert!(body.paragraphs.is_empty());
        assert_eq!(body.roots.len(), 2);
        assert_eq!(builder.paragraph_count(), 0);
    }
}
