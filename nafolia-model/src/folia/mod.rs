//! FoLiA document model
//!
//! # The High-Level Concept
//!
//!     A FoLiA document is a tree: text → paragraph → sentence → word, with annotation layers
//!     hanging off sentences (entities, chunks, ...) or off the text body (coreference). Span
//!     annotations point back at words, which makes the tree a graph.
//!
//!     Instead of owning pointers, every structural node lives in a vector inside [`TextBody`] and
//!     is addressed by a typed, copyable handle. Parents list their children by handle, children
//!     know their parent sentence by handle, and span annotations store word handles. The
//!     document order of words is the order in which they were added.
//!
//! # Declarations
//!
//!     FoLiA requires every (annotation type, set) pair used in the body to be declared in the
//!     metadata. [`Document::declare`] is idempotent and reports whether the declaration is new,
//!     so converters can call it on every item without tracking state of their own.

mod reader;
mod writer;

use std::collections::{BTreeMap, HashMap};

pub use reader::parse_folia;
pub use writer::{folia_to_element, write_folia};

pub const NS_FOLIA: &str = "http://ilk.uvt.nl/folia";

/// FoLiA version written into generated documents
pub const FOLIA_VERSION: &str = "1.2.0";

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a paragraph in [`TextBody::paragraphs`]
    ParagraphIdx
);
handle!(
    /// Handle to a sentence in [`TextBody::sentences`]
    SentenceIdx
);
handle!(
    /// Handle to a word in [`TextBody::words`]
    WordIdx
);
handle!(
    /// Handle to an annotation layer in [`TextBody::layers`]
    LayerIdx
);

/// Annotation types that can be declared in the metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Token,
    Paragraph,
    Sentence,
    Pos,
    Lemma,
    Sense,
    Entity,
    Chunking,
    Dependency,
    SemanticRole,
    Predicate,
    Sentiment,
    Coreference,
    Alignment,
}

impl AnnotationType {
    const ALL: [AnnotationType; 14] = [
        AnnotationType::Token,
        AnnotationType::Paragraph,
        AnnotationType::Sentence,
        AnnotationType::Pos,
        AnnotationType::Lemma,
        AnnotationType::Sense,
        AnnotationType::Entity,
        AnnotationType::Chunking,
        AnnotationType::Dependency,
        AnnotationType::SemanticRole,
        AnnotationType::Predicate,
        AnnotationType::Sentiment,
        AnnotationType::Coreference,
        AnnotationType::Alignment,
    ];

    /// Name of the declaration element, e.g. `pos-annotation`
    pub fn declaration_element(&self) -> &'static str {
        match self {
            AnnotationType::Token => "token-annotation",
            AnnotationType::Paragraph => "paragraph-annotation",
            AnnotationType::Sentence => "sentence-annotation",
            AnnotationType::Pos => "pos-annotation",
            AnnotationType::Lemma => "lemma-annotation",
            AnnotationType::Sense => "sense-annotation",
            AnnotationType::Entity => "entity-annotation",
            AnnotationType::Chunking => "chunking-annotation",
            AnnotationType::Dependency => "dependency-annotation",
            AnnotationType::SemanticRole => "semrole-annotation",
            AnnotationType::Predicate => "predicate-annotation",
            AnnotationType::Sentiment => "sentiment-annotation",
            AnnotationType::Coreference => "coreference-annotation",
            AnnotationType::Alignment => "alignment-annotation",
        }
    }

    pub fn from_declaration_element(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.declaration_element() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub annotation_type: AnnotationType,
    pub set: String,
    /// Default annotator for annotations of this type and set
    pub annotator: Option<String>,
    pub datetime: Option<String>,
}

/// Who produced an annotation, and when
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub annotator: Option<String>,
    pub datetime: Option<String>,
}

impl Provenance {
    pub fn is_empty(&self) -> bool {
        self.annotator.is_none() && self.datetime.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub declarations: Vec<Declaration>,
    pub text: TextBody,
    /// Element names of annotations found in the body that this model does not represent
    pub unsupported: Vec<String>,
    /// Annotations left out because a `wref` names no word of the document
    pub dangling: Vec<DanglingReference>,
}

/// A span annotation dropped while reading because one of its words does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Element name of the dropped annotation (`entity`, `semrole`, `coreferencelink`, ...)
    pub element: String,
    /// Its `xml:id`, when it has one
    pub annotation: Option<String>,
    /// The word id that did not resolve
    pub word: String,
}

impl Document {
    /// An empty document with a text body named `<id>.text`
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Document {
            text: TextBody::new(format!("{id}.text")),
            id,
            version: Some(FOLIA_VERSION.to_string()),
            metadata: BTreeMap::new(),
            declarations: Vec::new(),
            unsupported: Vec::new(),
            dangling: Vec::new(),
        }
    }

    /// Declare an annotation type and set; returns `false` when it was already declared
    pub fn declare(&mut self, annotation_type: AnnotationType, set: impl Into<String>) -> bool {
        let set = set.into();
        if self.is_declared(annotation_type, &set) {
            return false;
        }
        self.declarations.push(Declaration {
            annotation_type,
            set,
            annotator: None,
            datetime: None,
        });
        true
    }

    pub fn is_declared(&self, annotation_type: AnnotationType, set: &str) -> bool {
        self.declaration(annotation_type, Some(set)).is_some()
    }

    /// Declaration of a type; with `set` `None` the first declaration of that type
    pub fn declaration(
        &self,
        annotation_type: AnnotationType,
        set: Option<&str>,
    ) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| {
            decl.annotation_type == annotation_type && set.map_or(true, |set| decl.set == set)
        })
    }

    pub fn declaration_mut(
        &mut self,
        annotation_type: AnnotationType,
        set: &str,
    ) -> Option<&mut Declaration> {
        self.declarations
            .iter_mut()
            .find(|decl| decl.annotation_type == annotation_type && decl.set == set)
    }

    /// Provenance declared as default for a type (and set, when given)
    pub fn default_provenance(
        &self,
        annotation_type: AnnotationType,
        set: Option<&str>,
    ) -> Provenance {
        self.declaration(annotation_type, set)
            .or_else(|| self.declaration(annotation_type, None))
            .map(|decl| Provenance {
                annotator: decl.annotator.clone(),
                datetime: decl.datetime.clone(),
            })
            .unwrap_or_default()
    }

    pub fn language(&self) -> Option<&str> {
        self.metadata.get("language").map(String::as_str)
    }

    pub fn add_unsupported(&mut self, element: &str) {
        if !self.unsupported.iter().any(|name| name == element) {
            self.unsupported.push(element.to_string());
        }
    }
}

/// A top-level structure element of the text body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Paragraph(ParagraphIdx),
    Sentence(SentenceIdx),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub id: String,
    pub sentences: Vec<SentenceIdx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub id: String,
    pub paragraph: Option<ParagraphIdx>,
    pub words: Vec<WordIdx>,
    pub layers: Vec<LayerIdx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: String,
    pub text: String,
    /// Offset into the text body's content, only set when it was validated
    pub offset: Option<usize>,
    /// Whether the word is followed by a space
    pub space: bool,
    pub sentence: SentenceIdx,
    pub provenance: Provenance,
    pub annotations: Vec<WordAnnotation>,
    /// Alternative annotation sets, one `alt` element each
    pub alternatives: Vec<Vec<WordAnnotation>>,
}

impl Word {
    pub fn pos_annotations(&self) -> impl Iterator<Item = &PosAnnotation> {
        self.annotations.iter().filter_map(|annotation| match annotation {
            WordAnnotation::Pos(pos) => Some(pos),
            _ => None,
        })
    }

    pub fn lemma(&self) -> Option<&LemmaAnnotation> {
        self.annotations.iter().find_map(|annotation| match annotation {
            WordAnnotation::Lemma(lemma) => Some(lemma),
            _ => None,
        })
    }

    pub fn senses(&self) -> impl Iterator<Item = &SenseAnnotation> {
        self.annotations.iter().filter_map(|annotation| match annotation {
            WordAnnotation::Sense(sense) => Some(sense),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordAnnotation {
    Pos(PosAnnotation),
    Lemma(LemmaAnnotation),
    Sense(SenseAnnotation),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosAnnotation {
    pub set: Option<String>,
    pub class: String,
    /// The `head` feature: the coarse tag
    pub head: Option<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LemmaAnnotation {
    pub set: Option<String>,
    pub class: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenseAnnotation {
    pub set: Option<String>,
    pub class: String,
    pub confidence: Option<f64>,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub subset: String,
    pub class: String,
}

impl Feature {
    pub fn new(subset: impl Into<String>, class: impl Into<String>) -> Self {
        Feature {
            subset: subset.into(),
            class: class.into(),
        }
    }
}

/// Where an annotation layer lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerParent {
    Text,
    Sentence(SentenceIdx),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Entities,
    Chunking,
    Dependencies,
    SemanticRoles,
    Sentiments,
    Coreferences,
}

impl LayerKind {
    pub fn element_name(&self) -> &'static str {
        match self {
            LayerKind::Entities => "entities",
            LayerKind::Chunking => "chunking",
            LayerKind::Dependencies => "dependencies",
            LayerKind::SemanticRoles => "semroles",
            LayerKind::Sentiments => "sentiments",
            LayerKind::Coreferences => "coreferences",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub set: Option<String>,
    pub parent: LayerParent,
    pub annotations: Vec<SpanAnnotation>,
}

/// Shape specific parts of a span annotation
#[derive(Debug, Clone, PartialEq)]
pub enum SpanKind {
    Entity,
    Chunk,
    Dependency {
        head: Vec<WordIdx>,
        dependent: Vec<WordIdx>,
    },
    Predicate {
        roles: Vec<SpanAnnotation>,
    },
    SemanticRole,
    Sentiment {
        source: Vec<WordIdx>,
        target: Vec<WordIdx>,
    },
    CoreferenceChain {
        links: Vec<Vec<WordIdx>>,
    },
}

impl SpanKind {
    pub fn element_name(&self) -> &'static str {
        match self {
            SpanKind::Entity => "entity",
            SpanKind::Chunk => "chunk",
            SpanKind::Dependency { .. } => "dependency",
            SpanKind::Predicate { .. } => "predicate",
            SpanKind::SemanticRole => "semrole",
            SpanKind::Sentiment { .. } => "sentiment",
            SpanKind::CoreferenceChain { .. } => "coreferencechain",
        }
    }
}

/// An annotation over words
///
/// `span` holds the words referenced directly (`wref` children). Sentiments use it for their
/// head span; dependencies and coreference chains keep their words in [`SpanKind`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanAnnotation {
    pub kind: SpanKind,
    pub id: Option<String>,
    pub set: Option<String>,
    pub class: Option<String>,
    pub confidence: Option<f64>,
    pub span: Vec<WordIdx>,
    pub features: Vec<Feature>,
    pub alignments: Vec<Alignment>,
    pub comments: Vec<String>,
    pub provenance: Provenance,
}

impl SpanAnnotation {
    pub fn new(kind: SpanKind) -> Self {
        SpanAnnotation {
            kind,
            id: None,
            set: None,
            class: None,
            confidence: None,
            span: Vec::new(),
            features: Vec::new(),
            alignments: Vec::new(),
            comments: Vec::new(),
            provenance: Provenance::default(),
        }
    }

    /// Every word this annotation touches, in element order
    pub fn words(&self) -> Vec<WordIdx> {
        let mut words = self.span.clone();
        match &self.kind {
            SpanKind::Dependency { head, dependent } => {
                words.extend(head);
                words.extend(dependent);
            }
            SpanKind::Predicate { roles } => {
                for role in roles {
                    words.extend(role.words());
                }
            }
            SpanKind::Sentiment { source, target } => {
                words.extend(source);
                words.extend(target);
            }
            SpanKind::CoreferenceChain { links } => {
                for link in links {
                    words.extend(link);
                }
            }
            SpanKind::Entity | SpanKind::Chunk | SpanKind::SemanticRole => {}
        }
        words
    }
}

/// Link from an annotation to an external resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub class: Option<String>,
    pub href: Option<String>,
    pub format: Option<String>,
    pub confidence: Option<f64>,
    pub references: Vec<AlignReference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignReference {
    pub id: String,
    pub kind: String,
}

/// The `text` element and everything in it
#[derive(Debug, Clone, PartialEq)]
pub struct TextBody {
    pub id: String,
    /// Untokenised text (`t` directly under `text`), the reference for word offsets
    pub content: Option<String>,
    pub roots: Vec<Structure>,
    pub paragraphs: Vec<Paragraph>,
    pub sentences: Vec<Sentence>,
    pub words: Vec<Word>,
    pub layers: Vec<Layer>,
    /// Layers attached to the text body rather than a sentence
    pub text_layers: Vec<LayerIdx>,
    word_index: HashMap<String, WordIdx>,
}

impl TextBody {
    pub fn new(id: impl Into<String>) -> Self {
        TextBody {
            id: id.into(),
            content: None,
            roots: Vec::new(),
            paragraphs: Vec::new(),
            sentences: Vec::new(),
            words: Vec::new(),
            layers: Vec::new(),
            text_layers: Vec::new(),
            word_index: HashMap::new(),
        }
    }

    pub fn add_paragraph(&mut self, id: impl Into<String>) -> ParagraphIdx {
        let idx = ParagraphIdx(self.paragraphs.len());
        self.paragraphs.push(Paragraph {
            id: id.into(),
            sentences: Vec::new(),
        });
        self.roots.push(Structure::Paragraph(idx));
        idx
    }

    /// Add a sentence to a paragraph, or directly to the text body when `paragraph` is `None`
    pub fn add_sentence(
        &mut self,
        paragraph: Option<ParagraphIdx>,
        id: impl Into<String>,
    ) -> SentenceIdx {
        let idx = SentenceIdx(self.sentences.len());
        self.sentences.push(Sentence {
            id: id.into(),
            paragraph,
            words: Vec::new(),
            layers: Vec::new(),
        });
        match paragraph {
            Some(paragraph) => self.paragraphs[paragraph.0].sentences.push(idx),
            None => self.roots.push(Structure::Sentence(idx)),
        }
        idx
    }

    /// Append a word to a sentence; it is followed by a space until told otherwise
    pub fn add_word(
        &mut self,
        sentence: SentenceIdx,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> WordIdx {
        let idx = WordIdx(self.words.len());
        let id = id.into();
        self.word_index.insert(id.clone(), idx);
        self.words.push(Word {
            id,
            text: text.into(),
            offset: None,
            space: true,
            sentence,
            provenance: Provenance::default(),
            annotations: Vec::new(),
            alternatives: Vec::new(),
        });
        self.sentences[sentence.0].words.push(idx);
        idx
    }

    pub fn add_layer(
        &mut self,
        parent: LayerParent,
        kind: LayerKind,
        set: Option<String>,
    ) -> LayerIdx {
        let idx = LayerIdx(self.layers.len());
        self.layers.push(Layer {
            kind,
            set,
            parent,
            annotations: Vec::new(),
        });
        match parent {
            LayerParent::Text => self.text_layers.push(idx),
            LayerParent::Sentence(sentence) => self.sentences[sentence.0].layers.push(idx),
        }
        idx
    }

    pub fn paragraph(&self, idx: ParagraphIdx) -> &Paragraph {
        &self.paragraphs[idx.0]
    }

    pub fn sentence(&self, idx: SentenceIdx) -> &Sentence {
        &self.sentences[idx.0]
    }

    pub fn word(&self, idx: WordIdx) -> &Word {
        &self.words[idx.0]
    }

    pub fn word_mut(&mut self, idx: WordIdx) -> &mut Word {
        &mut self.words[idx.0]
    }

    pub fn layer(&self, idx: LayerIdx) -> &Layer {
        &self.layers[idx.0]
    }

    pub fn layer_mut(&mut self, idx: LayerIdx) -> &mut Layer {
        &mut self.layers[idx.0]
    }

    pub fn word_by_id(&self, id: &str) -> Option<WordIdx> {
        self.word_index.get(id).copied()
    }

    /// Sentences in document order, with the paragraph each belongs to
    pub fn sentences_in_order(&self) -> Vec<(Option<ParagraphIdx>, SentenceIdx)> {
        let mut result = Vec::new();
        for root in &self.roots {
            match *root {
                Structure::Paragraph(paragraph) => {
                    for sentence in &self.paragraphs[paragraph.0].sentences {
                        result.push((Some(paragraph), *sentence));
                    }
                }
                Structure::Sentence(sentence) => result.push((None, sentence)),
            }
        }
        result
    }

    /// Words in document order
    pub fn words_in_order(&self) -> Vec<WordIdx> {
        self.sentences_in_order()
            .into_iter()
            .flat_map(|(_, sentence)| self.sentences[sentence.0].words.iter().copied())
            .collect()
    }

    /// All span annotations of one layer kind, sentence layers first in document order, then
    /// text-level layers
    pub fn annotations(&self, kind: LayerKind) -> Vec<&SpanAnnotation> {
        let sentence_layers = self
            .sentences_in_order()
            .into_iter()
            .flat_map(|(_, sentence)| self.sentences[sentence.0].layers.iter().copied());
        sentence_layers
            .chain(self.text_layers.iter().copied())
            .map(|idx| &self.layers[idx.0])
            .filter(|layer| layer.kind == kind)
            .flat_map(|layer| layer.annotations.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boeing() -> Document {
        let mut doc = Document::new("boeing");
        let p = doc.text.add_paragraph("boeing.p.1");
        let s = doc.text.add_sentence(Some(p), "boeing.p.1.s.1");
        doc.text.add_word(s, "boeing.w1", "Boeing");
        doc.text.add_word(s, "boeing.w2", "loses");
        doc.text.add_word(s, "boeing.w3", "contract");
        doc
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut doc = Document::new("d");
        assert!(doc.declare(AnnotationType::Pos, "naf_pos"));
        assert!(!doc.declare(AnnotationType::Pos, "naf_pos"));
        assert!(doc.declare(AnnotationType::Pos, "naf_morphofeat"));
        assert_eq!(doc.declarations.len(), 2);
    }

    #[test]
    fn test_words_in_document_order() {
        let mut doc = boeing();
        let s = doc.text.add_sentence(None, "boeing.s.2");
        doc.text.add_word(s, "boeing.w4", "today");
        let ids: Vec<_> = doc
            .text
            .words_in_order()
            .into_iter()
            .map(|w| doc.text.word(w).id.as_str())
            .collect();
        assert_eq!(ids, ["boeing.w1", "boeing.w2", "boeing.w3", "boeing.w4"]);
    }

    #[test]
    fn test_word_index_and_sentence_handle() {
        let doc = boeing();
        let w2 = doc.text.word_by_id("boeing.w2").expect("indexed");
        let word = doc.text.word(w2);
        assert_eq!(word.text, "loses");
        assert_eq!(doc.text.sentence(word.sentence).id, "boeing.p.1.s.1");
        assert!(word.space);
    }

    #[test]
    fn test_annotations_collects_across_layers() {
        let mut doc = boeing();
        let s = doc.text.word(WordIdx(0)).sentence;
        let layer = doc
            .text
            .add_layer(LayerParent::Sentence(s), LayerKind::Entities, None);
        let mut entity = SpanAnnotation::new(SpanKind::Entity);
        entity.span = vec![WordIdx(0)];
        doc.text.layer_mut(layer).annotations.push(entity);
        assert_eq!(doc.text.annotations(LayerKind::Entities).len(), 1);
        assert!(doc.text.annotations(LayerKind::Chunking).is_empty());
    }

    #[test]
    fn test_default_provenance_falls_back_to_type() {
        let mut doc = Document::new("d");
        doc.declare(AnnotationType::Token, "tokconfig");
        if let Some(decl) = doc.declaration_mut(AnnotationType::Token, "tokconfig") {
            decl.annotator = Some("ucto".into());
        }
        let provenance = doc.default_provenance(AnnotationType::Token, None);
        assert_eq!(provenance.annotator.as_deref(), Some("ucto"));
    }
}
