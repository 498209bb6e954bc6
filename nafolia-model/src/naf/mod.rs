//! NAF document model
//!
//! Layers are kept as flat vectors in document order, exactly as they appear in the XML.
//! Cross-layer references (term → token, entity → term, ...) stay unresolved strings.

mod reader;
mod writer;

pub use reader::parse_naf;
pub use writer::{naf_to_element, write_naf};

/// A complete NAF document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NafDocument {
    pub lang: Option<String>,
    pub version: Option<String>,
    pub header: NafHeader,
    pub raw: Option<String>,
    pub tokens: Vec<Token>,
    pub terms: Vec<Term>,
    pub entities: Vec<Entity>,
    pub markables: Vec<Markable>,
    pub dependencies: Vec<Dependency>,
    pub chunks: Vec<Chunk>,
    pub coreferences: Vec<Coreference>,
    pub predicates: Vec<Predicate>,
    pub time_expressions: Vec<TimeExpression>,
    pub opinions: Vec<Opinion>,
    pub external_refs: ExternalRefs,
    /// Layers that are present in the source but have no model
    pub unsupported: Vec<UnsupportedLayer>,
}

impl NafDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self, id: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.id == id)
    }

    pub fn term(&self, id: &str) -> Option<&Term> {
        self.terms.iter().find(|term| term.id == id)
    }

    /// Processors recorded in the header for one layer
    pub fn processors(&self, layer: &str) -> &[Processor] {
        self.header
            .processors
            .iter()
            .find(|lps| lps.layer == layer)
            .map(|lps| lps.processors.as_slice())
            .unwrap_or(&[])
    }

    /// Append a processor to a layer's linguisticProcessors block, creating the block on first use
    pub fn add_processor(&mut self, layer: &str, processor: Processor) {
        match self
            .header
            .processors
            .iter_mut()
            .find(|lps| lps.layer == layer)
        {
            Some(lps) => lps.processors.push(processor),
            None => self.header.processors.push(LinguisticProcessors {
                layer: layer.to_string(),
                processors: vec![processor],
            }),
        }
    }
}

/// Layers NAF defines that nafolia reports but does not convert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedLayer {
    TemporalRelations,
    CausalRelations,
    Constituency,
    Factuality,
    Attribution,
}

impl UnsupportedLayer {
    pub const ALL: [UnsupportedLayer; 5] = [
        UnsupportedLayer::TemporalRelations,
        UnsupportedLayer::CausalRelations,
        UnsupportedLayer::Constituency,
        UnsupportedLayer::Factuality,
        UnsupportedLayer::Attribution,
    ];

    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "temporalRelations" => Some(UnsupportedLayer::TemporalRelations),
            "causalRelations" => Some(UnsupportedLayer::CausalRelations),
            "constituency" => Some(UnsupportedLayer::Constituency),
            "factualitylayer" | "factualities" => Some(UnsupportedLayer::Factuality),
            "attribution" => Some(UnsupportedLayer::Attribution),
            _ => None,
        }
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            UnsupportedLayer::TemporalRelations => "temporalRelations",
            UnsupportedLayer::CausalRelations => "causalRelations",
            UnsupportedLayer::Constituency => "constituency",
            UnsupportedLayer::Factuality => "factualities",
            UnsupportedLayer::Attribution => "attribution",
        }
    }

    /// Human readable title used in warnings
    pub fn title(&self) -> &'static str {
        match self {
            UnsupportedLayer::TemporalRelations => "Temporal Relations",
            UnsupportedLayer::CausalRelations => "Causal Relations",
            UnsupportedLayer::Constituency => "Constituency Parse (syntax)",
            UnsupportedLayer::Factuality => "Factuality",
            UnsupportedLayer::Attribution => "Attribution",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NafHeader {
    pub file_desc: Option<FileDesc>,
    pub public: Option<Public>,
    pub processors: Vec<LinguisticProcessors>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDesc {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creationtime: Option<String>,
    pub location: Option<String>,
    pub filename: Option<String>,
    pub filetype: Option<String>,
    pub publisher: Option<String>,
    pub magazine: Option<String>,
    pub section: Option<String>,
}

impl FileDesc {
    /// Attribute name and value of every field that is set, in schema order
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("creationtime", &self.creationtime),
            ("location", &self.location),
            ("filename", &self.filename),
            ("filetype", &self.filetype),
            ("publisher", &self.publisher),
            ("magazine", &self.magazine),
            ("section", &self.section),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Public {
    pub public_id: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticProcessors {
    pub layer: String,
    pub processors: Vec<Processor>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processor {
    pub name: String,
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub begin_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub hostname: Option<String>,
}

/// A word form (`wf`) of the text layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub id: String,
    pub sent: String,
    pub para: Option<String>,
    pub offset: Option<usize>,
    pub length: Option<usize>,
    pub text: String,
    /// `offset`/`length` attributes as written when they are not numbers; offset and length
    /// are then both unset
    pub malformed_position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Term {
    pub id: String,
    /// Token ids
    pub span: Vec<String>,
    pub term_type: Option<String>,
    pub lemma: Option<String>,
    pub pos: Option<String>,
    pub morphofeat: Option<String>,
    pub external_refs: Vec<ExternalRefId>,
    /// The term carried a term-level `sentiment` element
    pub has_sentiment: bool,
}

/// Handle into [`ExternalRefs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalRefId(usize);

impl ExternalRefId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRef {
    pub resource: String,
    pub reference: String,
    /// Kept verbatim; range checking happens at conversion time
    pub confidence: Option<String>,
    pub source: Option<String>,
    pub reftype: Option<String>,
    pub children: Vec<ExternalRefId>,
}

impl ExternalRef {
    pub fn new(resource: impl Into<String>, reference: impl Into<String>) -> Self {
        ExternalRef {
            resource: resource.into(),
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Arena of external references
///
/// Nesting is expressed through [`ExternalRef::children`]. Documents read from XML are trees,
/// but nothing stops a caller from linking a node back to an ancestor, so traversals must track
/// what they have visited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRefs {
    nodes: Vec<ExternalRef>,
}

impl ExternalRefs {
    pub fn add(&mut self, exref: ExternalRef) -> ExternalRefId {
        self.nodes.push(exref);
        ExternalRefId(self.nodes.len() - 1)
    }

    /// Add `exref` as the last child of `parent`
    pub fn add_child(&mut self, parent: ExternalRefId, exref: ExternalRef) -> ExternalRefId {
        let child = self.add(exref);
        self.link(parent, child);
        child
    }

    /// Make an existing node a child of `parent`
    pub fn link(&mut self, parent: ExternalRefId, child: ExternalRefId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn get(&self, id: ExternalRefId) -> &ExternalRef {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub id: String,
    pub entity_type: Option<String>,
    /// One span (term or token ids) per `references` block
    pub references: Vec<Vec<String>>,
    pub external_refs: Vec<ExternalRefId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markable {
    pub id: String,
    pub lemma: Option<String>,
    pub source: Option<String>,
    pub span: Vec<String>,
    pub external_refs: Vec<ExternalRefId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependency {
    /// Head term id
    pub from: String,
    /// Dependent term id
    pub to: String,
    pub function: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub head: Option<String>,
    pub phrase: Option<String>,
    pub case: Option<String>,
    pub span: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coreference {
    pub id: String,
    pub coref_type: Option<String>,
    pub spans: Vec<Vec<String>>,
    pub external_refs: Vec<ExternalRefId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub id: String,
    pub uri: Option<String>,
    pub confidence: Option<String>,
    pub span: Vec<String>,
    pub roles: Vec<Role>,
    pub external_refs: Vec<ExternalRefId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Role {
    pub id: String,
    pub sem_role: Option<String>,
    pub span: Vec<String>,
    pub external_refs: Vec<ExternalRefId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeExpression {
    pub id: String,
    pub timex_type: Option<String>,
    pub value: Option<String>,
    pub modifier: Option<String>,
    pub quant: Option<String>,
    pub freq: Option<String>,
    pub temporal_function: Option<String>,
    pub value_from_function: Option<String>,
    pub function_in_document: Option<String>,
    pub comment: Option<String>,
    /// Token ids; empty for document-level constructs such as the creation time
    pub span: Vec<String>,
}

impl TimeExpression {
    /// Feature subset name and value of every optional attribute that is set
    pub fn features(&self) -> Vec<(&'static str, &str)> {
        [
            ("value", &self.value),
            ("mod", &self.modifier),
            ("quant", &self.quant),
            ("freq", &self.freq),
            ("temporalFunction", &self.temporal_function),
            ("valueFromFunction", &self.value_from_function),
            ("functionInDocument", &self.function_in_document),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opinion {
    pub id: String,
    pub holder: Option<OpinionSpan>,
    pub target: Option<OpinionSpan>,
    pub expression: Option<OpinionExpression>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpinionSpan {
    pub span: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpinionExpression {
    pub polarity: Option<String>,
    pub strength: Option<String>,
    pub subjectivity: Option<String>,
    pub sentiment_semantic_type: Option<String>,
    pub sentiment_product_feature: Option<String>,
    pub span: Vec<String>,
}

impl OpinionExpression {
    /// Feature subset name and value of every sentiment attribute that is set
    pub fn features(&self) -> Vec<(&'static str, &str)> {
        [
            ("polarity", &self.polarity),
            ("strength", &self.strength),
            ("subjectivity", &self.subjectivity),
            ("semantic_type", &self.sentiment_semantic_type),
            ("product_feature", &self.sentiment_product_feature),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}
